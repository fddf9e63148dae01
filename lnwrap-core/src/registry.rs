//! # Type Registry
//!
//! An explicit, build-time-populated mapping from each concrete wire type
//! name to its descriptor and constructor function. Inbound stream items and
//! unary responses are resolved here; there is no runtime type-name
//! reflection. The registry is read-only after construction and safely
//! shared across concurrent calls.

use crate::codec::DecodeError;
use crate::descriptor::MessageDescriptor;
use crate::message::TypedMessage;
use std::collections::HashMap;

/// Constructor turning a raw JSON body into a typed message.
pub type MessageConstructor = fn(&serde_json::Value) -> Result<TypedMessage, DecodeError>;

/// One registered wire type.
#[derive(Clone, Copy)]
pub struct RegistryEntry {
    pub descriptor: &'static MessageDescriptor,
    pub constructor: MessageConstructor,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no message type '{0}' is registered")]
    UnknownType(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Registry of all wire types this client can receive.
#[derive(Default)]
pub struct TypeRegistry {
    entries: HashMap<&'static str, RegistryEntry>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wire type under its descriptor's name.
    pub fn register(&mut self, descriptor: &'static MessageDescriptor, constructor: MessageConstructor) {
        self.entries.insert(
            descriptor.name(),
            RegistryEntry {
                descriptor,
                constructor,
            },
        );
    }

    /// Resolves a wire type name to its registry entry.
    pub fn resolve(&self, type_name: &str) -> Option<&RegistryEntry> {
        self.entries.get(type_name)
    }

    /// Resolves `type_name` and constructs a typed message from `body`.
    pub fn construct(
        &self,
        type_name: &str,
        body: &serde_json::Value,
    ) -> Result<TypedMessage, RegistryError> {
        let entry = self
            .resolve(type_name)
            .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))?;
        Ok((entry.constructor)(body)?)
    }

    /// The registered wire type names, useful for diagnostics.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use serde_json::json;

    #[test]
    fn resolves_registered_types() {
        let registry = schema::default_registry();
        let message = registry
            .construct("OpenChannelRequest", &json!({"push_sat": 1}))
            .unwrap();
        assert_eq!(message.message_name(), "OpenChannelRequest");
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = schema::default_registry();
        let err = registry.construct("NoSuchType", &json!({})).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownType(_)));
    }

    #[test]
    fn decode_failures_propagate() {
        let registry = schema::default_registry();
        let err = registry
            .construct("OpenChannelRequest", &json!({"push_sat": 0.5}))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Decode(_)));
    }
}
