//! # JSON <-> TypedMessage Codec
//!
//! One generic traversal, driven entirely by descriptor metadata, converts
//! between JSON payloads and [`TypedMessage`] values for every message type.
//! There is no per-type generated logic.
//!
//! ## Wire shape
//!
//! * Field key = the descriptor's json name; nesting mirrors message
//!   structure.
//! * Map fields are a JSON **array of 2-field objects**, each carrying the
//!   key field and the value field side by side, never a native keyed
//!   object. This shape is load-bearing for interoperability with existing
//!   consumers and is reproduced exactly.
//! * Bytes are standard base64 strings; enums are symbolic name strings.
//! * Infinite and NaN float/double values travel as the literal string
//!   tokens `"inf"` / `"nan"`.
//! * Absent fields are omitted entirely: no null, no zero-value emission.
//!
//! Any conversion failure aborts the whole decode; no partial message is
//! ever returned.

use crate::descriptor::{Cardinality, MessageDescriptor, TypeCategory};
use crate::message::{TypedMessage, Value};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Token emitted and accepted for infinite float/double values.
pub const INFINITE: &str = "inf";
/// Token emitted and accepted for NaN float/double values.
pub const NAN: &str = "nan";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("expected a JSON object for message '{message}'")]
    ExpectedObject { message: &'static str },
    #[error("field '{field}' of message '{message}' expects a JSON array")]
    ExpectedArray {
        message: &'static str,
        field: &'static str,
    },
    #[error("field '{field}' of message '{message}' requires an exact {category} value")]
    InexactNumber {
        message: &'static str,
        field: &'static str,
        category: &'static str,
    },
    #[error("invalid JSON string value for {category} field '{field}', it cannot be: {token}")]
    InvalidFloatToken {
        field: &'static str,
        category: &'static str,
        token: String,
    },
    #[error("field '{field}' holds invalid base64 data: {source}")]
    InvalidBase64 {
        field: &'static str,
        source: base64::DecodeError,
    },
    #[error("unknown value '{value}' for enum '{enum_name}' in field '{field}'")]
    UnknownEnumValue {
        field: &'static str,
        enum_name: &'static str,
        value: String,
    },
    #[error("field '{field}' of message '{message}' expects a {expected} value")]
    TypeMismatch {
        message: &'static str,
        field: &'static str,
        expected: &'static str,
    },
}

/// Decodes a JSON payload into a typed message.
///
/// Iterates the descriptor's fields in declaration order; fields absent from
/// the payload stay unset. Unknown payload keys are ignored.
pub fn decode(
    payload: &serde_json::Value,
    descriptor: &'static MessageDescriptor,
) -> Result<TypedMessage, DecodeError> {
    let object = payload
        .as_object()
        .ok_or(DecodeError::ExpectedObject {
            message: descriptor.name(),
        })?;

    let mut builder = TypedMessage::builder(descriptor);
    for field in descriptor.fields() {
        let Some(raw) = object.get(field.wire_name()) else {
            continue;
        };
        let value = match field.cardinality() {
            Cardinality::Singular => decode_single(raw, descriptor.name(), field.name(), field.category())?,
            Cardinality::Repeated | Cardinality::Map => {
                let items = raw.as_array().ok_or(DecodeError::ExpectedArray {
                    message: descriptor.name(),
                    field: field.name(),
                })?;
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(decode_single(
                        item,
                        descriptor.name(),
                        field.name(),
                        field.category(),
                    )?);
                }
                Value::List(values)
            }
        };
        // The decoded value is well-typed by construction, so the builder's
        // own check cannot fail here.
        builder = builder.set(field.name(), value).map_err(|_| {
            DecodeError::TypeMismatch {
                message: descriptor.name(),
                field: field.name(),
                expected: field.category().label(),
            }
        })?;
    }
    Ok(builder.build())
}

fn decode_single(
    raw: &serde_json::Value,
    message: &'static str,
    field: &'static str,
    category: TypeCategory,
) -> Result<Value, DecodeError> {
    match category {
        TypeCategory::Int32 => {
            let n = exact_integer(raw)
                .and_then(|i| i32::try_from(i).ok())
                .ok_or(DecodeError::InexactNumber {
                    message,
                    field,
                    category: "int32",
                })?;
            Ok(Value::Int32(n))
        }
        TypeCategory::Int64 => {
            let n = exact_integer(raw).ok_or(DecodeError::InexactNumber {
                message,
                field,
                category: "int64",
            })?;
            Ok(Value::Int64(n))
        }
        TypeCategory::Float => Ok(Value::Float(decode_floating(raw, field, "float")? as f32)),
        TypeCategory::Double => Ok(Value::Double(decode_floating(raw, field, "double")?)),
        TypeCategory::Bool => raw
            .as_bool()
            .map(Value::Bool)
            .ok_or(DecodeError::TypeMismatch {
                message,
                field,
                expected: "bool",
            }),
        TypeCategory::String => raw
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or(DecodeError::TypeMismatch {
                message,
                field,
                expected: "string",
            }),
        TypeCategory::Bytes => {
            let text = raw.as_str().ok_or(DecodeError::TypeMismatch {
                message,
                field,
                expected: "base64 string",
            })?;
            let data = BASE64
                .decode(text)
                .map_err(|source| DecodeError::InvalidBase64 { field, source })?;
            Ok(Value::Bytes(data))
        }
        TypeCategory::Enum(enum_descriptor) => {
            let name = raw.as_str().ok_or(DecodeError::TypeMismatch {
                message,
                field,
                expected: "enum name string",
            })?;
            if !enum_descriptor.contains(name) {
                return Err(DecodeError::UnknownEnumValue {
                    field,
                    enum_name: enum_descriptor.name(),
                    value: name.to_string(),
                });
            }
            Ok(Value::Enum(name.to_string()))
        }
        TypeCategory::Message(nested) => Ok(Value::Message(decode(raw, nested)?)),
    }
}

/// Accepts only an exact, non-fractional numeric value.
fn exact_integer(raw: &serde_json::Value) -> Option<i64> {
    if let Some(i) = raw.as_i64() {
        return Some(i);
    }
    if let Some(u) = raw.as_u64() {
        return i64::try_from(u).ok();
    }
    let f = raw.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        return Some(f as i64);
    }
    None
}

/// Accepts a numeric literal, or exactly the lowercase tokens `"inf"` /
/// `"nan"`. No other string is accepted.
fn decode_floating(
    raw: &serde_json::Value,
    field: &'static str,
    category: &'static str,
) -> Result<f64, DecodeError> {
    if let Some(token) = raw.as_str() {
        return match token {
            INFINITE => Ok(f64::INFINITY),
            NAN => Ok(f64::NAN),
            _ => Err(DecodeError::InvalidFloatToken {
                field,
                category,
                token: token.to_string(),
            }),
        };
    }
    raw.as_f64().ok_or(DecodeError::InvalidFloatToken {
        field,
        category,
        token: raw.to_string(),
    })
}

/// Encodes a typed message into its JSON payload.
///
/// Mirrors [`decode`]: a field is emitted only if set, in descriptor
/// declaration order. Repeated and map fields emit arrays of the same shape
/// decode accepts.
pub fn encode(message: &TypedMessage) -> serde_json::Value {
    let descriptor = message.descriptor();
    let mut object = serde_json::Map::new();
    for field in descriptor.fields() {
        if let Some(value) = message.get(field.name()) {
            object.insert(field.wire_name().to_string(), encode_value(value));
        }
    }
    serde_json::Value::Object(object)
}

fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Int32(v) => serde_json::Value::from(*v),
        Value::Int64(v) => serde_json::Value::from(*v),
        Value::Float(v) => encode_floating(f64::from(*v)),
        Value::Double(v) => encode_floating(*v),
        Value::Bool(v) => serde_json::Value::from(*v),
        Value::String(v) => serde_json::Value::from(v.as_str()),
        Value::Bytes(v) => serde_json::Value::from(BASE64.encode(v)),
        Value::Enum(name) => serde_json::Value::from(name.as_str()),
        Value::Message(nested) => encode(nested),
        Value::List(items) => serde_json::Value::Array(items.iter().map(encode_value).collect()),
    }
}

fn encode_floating(v: f64) -> serde_json::Value {
    if v.is_infinite() {
        return serde_json::Value::from(INFINITE);
    }
    if v.is_nan() {
        return serde_json::Value::from(NAN);
    }
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Renders a JSON value to a string, optionally pretty printed with
/// indentation and newlines.
pub fn json_to_string(value: &serde_json::Value, pretty_print: bool) -> Result<String, serde_json::Error> {
    if pretty_print {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use serde_json::json;

    #[test]
    fn integer_fields_require_exact_values() {
        let payload = json!({"push_sat": 25000.5});
        let err = decode(&payload, schema::open_channel_request()).unwrap_err();
        assert!(matches!(err, DecodeError::InexactNumber { field: "push_sat", .. }));
    }

    #[test]
    fn int32_range_is_enforced() {
        let payload = json!({"target_conf": i64::from(i32::MAX) + 1});
        let err = decode(&payload, schema::open_channel_request()).unwrap_err();
        assert!(matches!(err, DecodeError::InexactNumber { field: "target_conf", .. }));
    }

    #[test]
    fn unknown_payload_keys_are_ignored() {
        let payload = json!({"push_sat": 1, "not_in_schema": true});
        let message = decode(&payload, schema::open_channel_request()).unwrap();
        assert_eq!(message.get("push_sat"), Some(&Value::Int64(1)));
    }

    #[test]
    fn invalid_base64_fails_the_whole_decode() {
        let payload = json!({"node_pubkey": "not!!base64", "push_sat": 1});
        let err = decode(&payload, schema::open_channel_request()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64 { field: "node_pubkey", .. }));
    }

    #[test]
    fn unresolvable_enum_name_fails() {
        let payload = json!({"state": "NOT_A_STATE"});
        let err = decode(&payload, schema::invoice()).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEnumValue { .. }));
    }

    #[test]
    fn float_tokens_decode_to_special_values() {
        let payload = json!({"fee_rate": "inf"});
        let message = decode(&payload, schema::channel_fee_report()).unwrap();
        assert_eq!(message.get("fee_rate"), Some(&Value::Double(f64::INFINITY)));

        let payload = json!({"fee_rate": "nan"});
        let message = decode(&payload, schema::channel_fee_report()).unwrap();
        match message.get("fee_rate") {
            Some(Value::Double(v)) => assert!(v.is_nan()),
            other => panic!("expected a double, got {other:?}"),
        }
    }

    #[test]
    fn other_float_strings_are_rejected() {
        let payload = json!({"fee_rate": "Infinity"});
        let err = decode(&payload, schema::channel_fee_report()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFloatToken { .. }));
    }

    #[test]
    fn special_floats_encode_as_tokens() {
        let message = crate::message::TypedMessage::builder(schema::channel_fee_report())
            .set("fee_rate", Value::Double(f64::INFINITY))
            .unwrap()
            .build();
        assert_eq!(encode(&message), json!({"fee_rate": "inf"}));

        let message = crate::message::TypedMessage::builder(schema::channel_fee_report())
            .set("fee_rate", Value::Double(f64::NAN))
            .unwrap()
            .build();
        assert_eq!(encode(&message), json!({"fee_rate": "nan"}));

        let message = crate::message::TypedMessage::builder(schema::channel_fee_report())
            .set("fee_rate", Value::Double(f64::NEG_INFINITY))
            .unwrap()
            .build();
        assert_eq!(encode(&message), json!({"fee_rate": "inf"}));
    }

    #[test]
    fn json_rendering_supports_pretty_print() {
        let value = json!({"push_sat": 1});
        assert_eq!(json_to_string(&value, false).unwrap(), r#"{"push_sat":1}"#);
        assert!(json_to_string(&value, true).unwrap().contains('\n'));
    }

    #[test]
    fn decode_then_encode_preserves_the_payload() {
        let payload = json!({"push_sat": 25000, "target_conf": 0});
        let message = decode(&payload, schema::open_channel_request()).unwrap();
        assert_eq!(encode(&message), payload);
    }

    #[test]
    fn map_fields_use_the_pair_array_shape() {
        let payload = json!({"dest_custom_records": [{"key": 5482373484_i64, "value": "AQI="}]});
        let message = decode(&payload, schema::send_request()).unwrap();
        match message.get("dest_custom_records") {
            Some(Value::List(entries)) => assert_eq!(entries.len(), 1),
            other => panic!("expected a list, got {other:?}"),
        }
        assert_eq!(encode(&message), payload);
    }

    #[test]
    fn decode_aborts_without_partial_result() {
        // First field decodes fine, second fails: the whole decode errors.
        let payload = json!({"push_sat": 1, "target_conf": 1.5});
        assert!(decode(&payload, schema::open_channel_request()).is_err());
    }
}
