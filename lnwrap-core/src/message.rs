//! # Typed Messages
//!
//! [`TypedMessage`] is the in-memory representation of a daemon message:
//! a mapping from field name to [`Value`], checked against the message's
//! [`MessageDescriptor`]. Instances are built through a mutable
//! [`TypedMessageBuilder`] and sealed into an immutable value before
//! transmission. Unset fields are absent, never defaulted.

use crate::codec;
use crate::descriptor::{Cardinality, MessageDescriptor, TypeCategory};
use std::collections::HashMap;
use std::fmt;

/// A single field value.
///
/// Repeated fields and map fields both hold a [`Value::List`]; map entries
/// are [`Value::Message`] values of the field's synthetic entry descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    /// The symbolic name of an enum value.
    Enum(String),
    Message(TypedMessage),
    List(Vec<Value>),
}

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("message '{message}' has no field named '{field}'")]
    UnknownField { message: &'static str, field: String },
    #[error("value for field '{field}' of message '{message}' does not match its declared {expected} type")]
    ValueMismatch {
        message: &'static str,
        field: &'static str,
        expected: &'static str,
    },
}

/// An immutable, schema-checked message value.
#[derive(Debug, Clone)]
pub struct TypedMessage {
    descriptor: &'static MessageDescriptor,
    fields: HashMap<&'static str, Value>,
}

impl TypedMessage {
    /// Starts building a message of the given type.
    pub fn builder(descriptor: &'static MessageDescriptor) -> TypedMessageBuilder {
        TypedMessageBuilder {
            descriptor,
            fields: HashMap::new(),
        }
    }

    pub fn descriptor(&self) -> &'static MessageDescriptor {
        self.descriptor
    }

    /// The name of the underlying message type.
    pub fn message_name(&self) -> &'static str {
        self.descriptor.name()
    }

    /// Returns the value of a field, or `None` if the field is unset.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Converts the message into its JSON wire representation.
    pub fn to_json(&self) -> serde_json::Value {
        codec::encode(self)
    }
}

impl PartialEq for TypedMessage {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.descriptor, other.descriptor) && self.fields == other.fields
    }
}

impl fmt::Display for TypedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self.to_json()).map_err(|_| fmt::Error)?;
        write!(f, "{}: {}", self.message_name(), json)
    }
}

/// Mutable builder for a [`TypedMessage`].
#[derive(Debug, Clone)]
pub struct TypedMessageBuilder {
    descriptor: &'static MessageDescriptor,
    fields: HashMap<&'static str, Value>,
}

impl TypedMessageBuilder {
    /// Sets a field, checking the value against the field's declared type
    /// category and cardinality.
    pub fn set(mut self, field: &str, value: Value) -> Result<Self, MessageError> {
        let descriptor = self.descriptor.field(field).ok_or_else(|| {
            MessageError::UnknownField {
                message: self.descriptor.name(),
                field: field.to_string(),
            }
        })?;
        if !value_matches(descriptor.cardinality(), descriptor.category(), &value) {
            return Err(MessageError::ValueMismatch {
                message: self.descriptor.name(),
                field: descriptor.name(),
                expected: descriptor.category().label(),
            });
        }
        self.fields.insert(descriptor.name(), value);
        Ok(self)
    }

    /// Removes a field, returning it to the unset state.
    pub fn clear(mut self, field: &str) -> Self {
        self.fields.remove(field);
        self
    }

    /// Seals the builder into an immutable message.
    pub fn build(self) -> TypedMessage {
        TypedMessage {
            descriptor: self.descriptor,
            fields: self.fields,
        }
    }
}

fn value_matches(cardinality: Cardinality, category: TypeCategory, value: &Value) -> bool {
    match cardinality {
        Cardinality::Singular => single_value_matches(category, value),
        Cardinality::Repeated | Cardinality::Map => match value {
            Value::List(items) => items.iter().all(|v| single_value_matches(category, v)),
            _ => false,
        },
    }
}

fn single_value_matches(category: TypeCategory, value: &Value) -> bool {
    match (category, value) {
        (TypeCategory::Int32, Value::Int32(_)) => true,
        (TypeCategory::Int64, Value::Int64(_)) => true,
        (TypeCategory::Float, Value::Float(_)) => true,
        (TypeCategory::Double, Value::Double(_)) => true,
        (TypeCategory::Bool, Value::Bool(_)) => true,
        (TypeCategory::String, Value::String(_)) => true,
        (TypeCategory::Bytes, Value::Bytes(_)) => true,
        (TypeCategory::Enum(_), Value::Enum(_)) => true,
        (TypeCategory::Message(descriptor), Value::Message(message)) => {
            std::ptr::eq(descriptor, message.descriptor())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn builder_rejects_unknown_fields() {
        let result = TypedMessage::builder(schema::open_channel_request())
            .set("no_such_field", Value::Int64(1));
        assert!(matches!(result, Err(MessageError::UnknownField { .. })));
    }

    #[test]
    fn builder_rejects_mistyped_values() {
        let result = TypedMessage::builder(schema::open_channel_request())
            .set("push_sat", Value::String("25000".to_string()));
        assert!(matches!(result, Err(MessageError::ValueMismatch { .. })));
    }

    #[test]
    fn unset_fields_are_absent() {
        let message = TypedMessage::builder(schema::open_channel_request())
            .set("push_sat", Value::Int64(25000))
            .unwrap()
            .build();
        assert!(message.is_set("push_sat"));
        assert!(!message.is_set("target_conf"));
        assert_eq!(message.get("target_conf"), None);
    }

    #[test]
    fn structural_equality() {
        let build = || {
            TypedMessage::builder(schema::open_channel_request())
                .set("push_sat", Value::Int64(25000))
                .unwrap()
                .build()
        };
        assert_eq!(build(), build());
    }
}
