//! # Lnwrap Core
//!
//! `lnwrap-core` gives typed, validated, human-readable access to the RPC
//! interface of an LND-style daemon. Payloads cross this layer as JSON (or
//! XML), while callers work with [`message::TypedMessage`] values checked
//! against a static schema.
//!
//! ## Key Components
//!
//! * **[`codec`]:** A schema-driven bidirectional codec between JSON payloads
//!   and typed messages. One generic traversal, parameterized by descriptor
//!   metadata, serves every message type.
//! * **[`validation`]:** A recursive required-field validator producing a
//!   problem tree ([`validation::ValidationResult`]).
//! * **[`status`]:** A classifier partitioning failed-call status codes into
//!   three retry-relevant fault kinds. Classification is advisory only; this
//!   layer never retries.
//! * **[`stream`]:** An adapter applying decode + validate + classify
//!   uniformly to a push-based server stream, with an Open/Completed/Errored
//!   state machine and an at-most-one-terminal-event contract.
//! * **[`client`]:** The call-path glue: an explicit [`client::ApiContext`]
//!   replaces process-wide singletons, and transport contracts are plain
//!   traits so channel/TLS/macaroon concerns stay with the caller.
//!
//! ## Schema
//!
//! Message descriptors are process-wide static data ([`descriptor`]), built
//! once and shared across concurrent calls. The [`schema`] module carries a
//! pre-built descriptor set for a slice of the LND API together with a
//! [`registry::TypeRegistry`] resolving wire type names to constructors.
//!
//! ## Re-exports
//!
//! This crate re-exports `tonic` so that consumers use a compatible version
//! of the status-code types flowing through the transport boundary.
pub mod client;
pub mod codec;
pub mod descriptor;
pub mod message;
pub mod registry;
pub mod schema;
pub mod status;
pub mod stream;
pub mod validation;
pub mod xml;

// Re-exports
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds and causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
