//! # Lnwrap Client
//!
//! Call-path glue between typed messages and the transport boundary.
//!
//! Transport and channel setup (TLS, macaroon injection, endpoints) are
//! external collaborators: callers implement [`UnaryTransport`] and
//! [`StreamTransport`] over whatever channel they own, and this layer only
//! requires that surfaced failures carry a status code where one exists.
//!
//! Two delivery models are offered:
//!
//! * **Unary/drained** ([`LnwrapClient::call`], [`LnwrapClient::call_streaming`]):
//!   the caller awaits the call to completion. A streamed call is drained
//!   **eagerly and completely** into an ordered in-memory sequence before it
//!   returns; consumption is not lazy, and an unbounded remote stream can
//!   grow memory without bound. This is an explicit limitation of the
//!   drained model, not a bug.
//! * **Subscribed** ([`LnwrapClient::subscribe`]): events are pumped through
//!   the [`StreamAdapter`] into a bounded channel and consumed via a
//!   [`Subscription`] handle.
//!
//! All behavior toggles travel in an explicit [`ApiContext`] passed at
//! construction; there are no process-wide mutable singletons. The
//! validation flag is copied into each call when it starts, so toggling it
//! between calls is safe and a call in flight never observes a change.

use crate::codec;
use crate::message::TypedMessage;
use crate::registry::{RegistryError, TypeRegistry};
use crate::status::{self, RpcFailure};
use crate::stream::{
    self, DEFAULT_EVENT_CAPACITY, StreamAdapter, StreamEvent, Subscription,
};
use crate::validation::{self, ValidationError};
use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use tracing::debug;

/// A raw message as exchanged with the transport: the concrete wire type
/// name plus the textual JSON body.
#[derive(Debug, Clone)]
pub struct WireMessage {
    pub type_name: String,
    pub body: serde_json::Value,
}

/// Unary call contract of the external transport layer.
pub trait UnaryTransport {
    fn call(
        &mut self,
        request: WireMessage,
    ) -> impl Future<Output = Result<WireMessage, tonic::Status>> + Send;
}

/// Server-stream subscription contract of the external transport layer.
pub trait StreamTransport {
    type Stream: Stream<Item = Result<WireMessage, tonic::Status>> + Send + 'static;

    fn subscribe(
        &mut self,
        request: WireMessage,
    ) -> impl Future<Output = Result<Self::Stream, tonic::Status>> + Send;
}

/// Errors surfaced by a dynamic call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The message failed validation before send or after receive.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The response payload did not match its descriptor.
    #[error(transparent)]
    Response(#[from] RegistryError),
    /// The call failed at the RPC level; the failure carries its
    /// classification.
    #[error(transparent)]
    Rpc(#[from] RpcFailure),
}

/// Explicit per-client configuration, passed into every call.
#[derive(Clone)]
pub struct ApiContext {
    registry: Arc<TypeRegistry>,
    perform_validation: bool,
    subscription_capacity: usize,
}

impl ApiContext {
    /// Creates a context with validation enabled.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            perform_validation: true,
            subscription_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Disables validation of sent and received messages.
    pub fn without_validation(mut self) -> Self {
        self.perform_validation = false;
        self
    }

    /// Overrides the bound of subscription event channels.
    pub fn with_subscription_capacity(mut self, capacity: usize) -> Self {
        self.subscription_capacity = capacity.max(1);
        self
    }

    /// True if sent and received messages are validated.
    pub fn perform_validation(&self) -> bool {
        self.perform_validation
    }

    pub fn set_perform_validation(&mut self, perform_validation: bool) {
        self.perform_validation = perform_validation;
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn registry_handle(&self) -> Arc<TypeRegistry> {
        Arc::clone(&self.registry)
    }
}

/// The client for typed, validated calls against the daemon.
pub struct LnwrapClient<T> {
    transport: T,
    context: ApiContext,
}

impl<T> LnwrapClient<T> {
    pub fn new(transport: T, context: ApiContext) -> Self {
        Self { transport, context }
    }

    pub fn context(&self) -> &ApiContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ApiContext {
        &mut self.context
    }

    /// Validates (when enabled) and encodes an outbound request.
    fn process_request(
        &self,
        message: &TypedMessage,
        perform_validation: bool,
    ) -> Result<WireMessage, ApiError> {
        debug!(message = %message.message_name(), "sending request message");
        if perform_validation {
            let result = validation::validate(message);
            if !result.is_valid() {
                return Err(ValidationError::new(result).into());
            }
        }
        Ok(WireMessage {
            type_name: message.message_name().to_string(),
            body: codec::encode(message),
        })
    }

    /// Decodes and validates (when enabled) an inbound unary response.
    fn process_response(
        &self,
        wire: WireMessage,
        perform_validation: bool,
    ) -> Result<TypedMessage, ApiError> {
        let message = self.context.registry().construct(&wire.type_name, &wire.body)?;
        debug!(message = %message.message_name(), "received response message");
        if perform_validation {
            let result = validation::validate(&message);
            if !result.is_valid() {
                return Err(ValidationError::new(result).into());
            }
        }
        Ok(message)
    }
}

impl<T: UnaryTransport> LnwrapClient<T> {
    /// Performs a unary call: validate, encode, send, decode, validate.
    pub async fn call(&mut self, request: TypedMessage) -> Result<TypedMessage, ApiError> {
        let perform_validation = self.context.perform_validation;
        let wire = self.process_request(&request, perform_validation)?;
        match self.transport.call(wire).await {
            Ok(response) => self.process_response(response, perform_validation),
            Err(raw) => Err(ApiError::Rpc(status::classify(raw))),
        }
    }
}

impl<T: StreamTransport> LnwrapClient<T> {
    /// Performs a streamed call and drains it eagerly into an ordered
    /// in-memory sequence.
    ///
    /// The returned messages are complete: the remote stream was consumed to
    /// its terminal event before this method returned. A terminal error
    /// discards any already-buffered items and surfaces as `Err`.
    pub async fn call_streaming(
        &mut self,
        request: TypedMessage,
    ) -> Result<Vec<TypedMessage>, ApiError> {
        let perform_validation = self.context.perform_validation;
        let wire = self.process_request(&request, perform_validation)?;
        let raw = match self.transport.subscribe(wire).await {
            Ok(raw) => raw,
            Err(raw_error) => return Err(ApiError::Rpc(status::classify(raw_error))),
        };

        let mut adapter = StreamAdapter::new(self.context.registry_handle(), perform_validation);
        let mut items = Vec::new();
        tokio::pin!(raw);
        loop {
            let event = match raw.next().await {
                Some(Ok(item)) => adapter.on_item(item),
                Some(Err(raw_error)) => adapter.on_error(raw_error),
                None => adapter.on_completed(),
            };
            match event {
                Some(StreamEvent::Item(message)) => items.push(message),
                Some(StreamEvent::Error(failure)) => return Err(ApiError::Rpc(failure)),
                Some(StreamEvent::Completed) => return Ok(items),
                None => return Ok(items),
            }
        }
    }

    /// Starts a subscribed streamed call, returning a [`Subscription`]
    /// handle over the adapted event stream.
    pub async fn subscribe(&mut self, request: TypedMessage) -> Result<Subscription, ApiError> {
        let perform_validation = self.context.perform_validation;
        let wire = self.process_request(&request, perform_validation)?;
        let raw = match self.transport.subscribe(wire).await {
            Ok(raw) => raw,
            Err(raw_error) => return Err(ApiError::Rpc(status::classify(raw_error))),
        };
        let adapter = StreamAdapter::new(self.context.registry_handle(), perform_validation);
        Ok(stream::spawn_subscription_with_capacity(
            raw,
            adapter,
            self.context.subscription_capacity,
        ))
    }
}
