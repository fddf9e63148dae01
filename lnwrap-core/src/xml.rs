//! # XML marshal/unmarshal
//!
//! XML counterpart of the JSON codec, governed by a version-selected parser.
//! [`XmlParserFactory`] owns one parser per supported schema version
//! (currently `"1.0"`); asking for an unsupported version is an error.
//!
//! The element shape mirrors the JSON contract: one element per set field in
//! descriptor order, nested messages nest their field elements, and repeated
//! and map fields wrap `<entry>` elements (map entries carrying the key and
//! value elements side by side). Unmarshalling validates against the
//! supplied schema: unknown root elements, unknown field elements and
//! category-invalid text all fail the whole unmarshal.

use crate::codec::{INFINITE, NAN};
use crate::descriptor::{Cardinality, FieldDescriptor, MessageDescriptor, TypeCategory};
use crate::message::{MessageError, TypedMessage, Value};
use crate::registry::TypeRegistry;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io::{BufRead, Cursor, Write};
use std::sync::Arc;

/// The schema version implemented by [`XmlParser::v1`].
pub const VERSION_1_0: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("no XML parser with version '{0}' is supported")]
    UnsupportedVersion(String),
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error("error writing XML: {0}")]
    Write(String),
    #[error("unknown root element '{0}', expected a registered message type")]
    UnknownRootType(String),
    #[error("unexpected element '{element}' in message '{message}'")]
    UnexpectedElement {
        message: &'static str,
        element: String,
    },
    #[error("invalid text '{text}' for {category} field '{field}'")]
    InvalidText {
        field: &'static str,
        category: &'static str,
        text: String,
    },
    #[error("unexpected end of XML document")]
    UnexpectedEof,
    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Factory maintaining the supported XML parser versions.
pub struct XmlParserFactory {
    parsers: HashMap<&'static str, XmlParser>,
}

impl XmlParserFactory {
    /// Creates a factory holding every supported parser version, all backed
    /// by the given registry as their schema artifact.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        let mut parsers = HashMap::new();
        parsers.insert(VERSION_1_0, XmlParser::v1(registry));
        Self { parsers }
    }

    /// Retrieves the parser for a version string such as `"1.0"`.
    pub fn parser(&self, version: &str) -> Result<&XmlParser, XmlError> {
        self.parsers
            .get(version)
            .ok_or_else(|| XmlError::UnsupportedVersion(version.to_string()))
    }

    pub fn supported_versions(&self) -> Vec<&'static str> {
        self.parsers.keys().copied().collect()
    }
}

/// Marshals and unmarshals typed messages against one schema version.
pub struct XmlParser {
    version: &'static str,
    registry: Arc<TypeRegistry>,
}

impl XmlParser {
    fn v1(registry: Arc<TypeRegistry>) -> Self {
        Self {
            version: VERSION_1_0,
            registry,
        }
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    /// Converts a message into its XML representation (UTF-8).
    pub fn marshal(&self, message: &TypedMessage) -> Result<Vec<u8>, XmlError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        write_message(&mut writer, message)?;
        Ok(writer.into_inner().into_inner())
    }

    /// Like [`Self::marshal`], indented for human consumption.
    pub fn marshal_pretty(&self, message: &TypedMessage) -> Result<Vec<u8>, XmlError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        write_message(&mut writer, message)?;
        Ok(writer.into_inner().into_inner())
    }

    /// Parses an XML document into a typed message, validated against the
    /// registry's descriptors.
    pub fn unmarshal(&self, data: &[u8]) -> Result<TypedMessage, XmlError> {
        let mut reader = Reader::from_reader(data);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        loop {
            match read_event(&mut reader, &mut buf)? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let descriptor = self
                        .registry
                        .resolve(&name)
                        .map(|entry| entry.descriptor)
                        .ok_or(XmlError::UnknownRootType(name))?;
                    return parse_message(&mut reader, descriptor);
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let descriptor = self
                        .registry
                        .resolve(&name)
                        .map(|entry| entry.descriptor)
                        .ok_or(XmlError::UnknownRootType(name))?;
                    return Ok(TypedMessage::builder(descriptor).build());
                }
                Event::Eof => return Err(XmlError::UnexpectedEof),
                _ => {}
            }
            buf.clear();
        }
    }
}

fn read_event<'b, R: BufRead>(
    reader: &mut Reader<R>,
    buf: &'b mut Vec<u8>,
) -> Result<Event<'b>, XmlError> {
    reader
        .read_event_into(buf)
        .map_err(|e| XmlError::Malformed(e.to_string()))
}

fn parse_message<R: BufRead>(
    reader: &mut Reader<R>,
    descriptor: &'static MessageDescriptor,
) -> Result<TypedMessage, XmlError> {
    let mut builder = TypedMessage::builder(descriptor);
    let mut buf = Vec::new();
    loop {
        match read_event(reader, &mut buf)? {
            Event::Start(e) => {
                let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let field = descriptor.field_by_wire_name(&element).ok_or_else(|| {
                    XmlError::UnexpectedElement {
                        message: descriptor.name(),
                        element: element.clone(),
                    }
                })?;
                let value = match field.cardinality() {
                    Cardinality::Singular => match field.category() {
                        TypeCategory::Message(nested) => {
                            Value::Message(parse_message(reader, nested)?)
                        }
                        category => parse_scalar(reader, field, category)?,
                    },
                    Cardinality::Repeated | Cardinality::Map => {
                        parse_entries(reader, descriptor.name(), field)?
                    }
                };
                builder = builder.set(field.name(), value)?;
            }
            Event::Empty(e) => {
                let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let field = descriptor.field_by_wire_name(&element).ok_or_else(|| {
                    XmlError::UnexpectedElement {
                        message: descriptor.name(),
                        element: element.clone(),
                    }
                })?;
                let value = empty_element_value(field)?;
                builder = builder.set(field.name(), value)?;
            }
            Event::End(_) => return Ok(builder.build()),
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
}

/// Value of a self-closing field element.
fn empty_element_value(field: &FieldDescriptor) -> Result<Value, XmlError> {
    match field.cardinality() {
        Cardinality::Repeated | Cardinality::Map => Ok(Value::List(Vec::new())),
        Cardinality::Singular => match field.category() {
            TypeCategory::Message(nested) => {
                Ok(Value::Message(TypedMessage::builder(nested).build()))
            }
            category => scalar_from_text(field, category, ""),
        },
    }
}

/// Collects the text content of a scalar field element up to its end tag
/// and converts it by type category.
fn parse_scalar<R: BufRead>(
    reader: &mut Reader<R>,
    field: &FieldDescriptor,
    category: TypeCategory,
) -> Result<Value, XmlError> {
    let mut text = String::new();
    let mut buf = Vec::new();
    loop {
        match read_event(reader, &mut buf)? {
            Event::Text(t) => {
                let chunk = t
                    .unescape()
                    .map_err(|e| XmlError::Malformed(e.to_string()))?;
                text.push_str(&chunk);
            }
            Event::CData(t) => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    scalar_from_text(field, category, &text)
}

fn parse_entries<R: BufRead>(
    reader: &mut Reader<R>,
    message: &'static str,
    field: &FieldDescriptor,
) -> Result<Value, XmlError> {
    let mut items = Vec::new();
    let mut buf = Vec::new();
    loop {
        match read_event(reader, &mut buf)? {
            Event::Start(e) => {
                let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if element != "entry" {
                    return Err(XmlError::UnexpectedElement { message, element });
                }
                let item = match field.category() {
                    TypeCategory::Message(nested) => Value::Message(parse_message(reader, nested)?),
                    category => parse_scalar(reader, field, category)?,
                };
                items.push(item);
            }
            Event::Empty(e) => {
                let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if element != "entry" {
                    return Err(XmlError::UnexpectedElement { message, element });
                }
                match field.category() {
                    TypeCategory::Message(nested) => {
                        items.push(Value::Message(TypedMessage::builder(nested).build()));
                    }
                    category => items.push(scalar_from_text(field, category, "")?),
                }
            }
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(Value::List(items))
}

fn scalar_from_text(
    field: &FieldDescriptor,
    category: TypeCategory,
    text: &str,
) -> Result<Value, XmlError> {
    let invalid = || XmlError::InvalidText {
        field: field.name(),
        category: category.label(),
        text: text.to_string(),
    };
    match category {
        TypeCategory::Int32 => text.trim().parse().map(Value::Int32).map_err(|_| invalid()),
        TypeCategory::Int64 => text.trim().parse().map(Value::Int64).map_err(|_| invalid()),
        TypeCategory::Float => match text.trim() {
            INFINITE => Ok(Value::Float(f32::INFINITY)),
            NAN => Ok(Value::Float(f32::NAN)),
            t => t
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Float)
                .ok_or_else(invalid),
        },
        TypeCategory::Double => match text.trim() {
            INFINITE => Ok(Value::Double(f64::INFINITY)),
            NAN => Ok(Value::Double(f64::NAN)),
            t => t
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Double)
                .ok_or_else(invalid),
        },
        TypeCategory::Bool => match text.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        TypeCategory::String => Ok(Value::String(text.to_string())),
        TypeCategory::Bytes => BASE64
            .decode(text.trim())
            .map(Value::Bytes)
            .map_err(|_| invalid()),
        TypeCategory::Enum(enum_descriptor) => {
            let name = text.trim();
            if enum_descriptor.contains(name) {
                Ok(Value::Enum(name.to_string()))
            } else {
                Err(invalid())
            }
        }
        TypeCategory::Message(_) => Err(invalid()),
    }
}

fn write_message<W: Write>(writer: &mut Writer<W>, message: &TypedMessage) -> Result<(), XmlError> {
    let name = message.message_name();
    write_event(writer, Event::Start(BytesStart::new(name)))?;
    write_fields(writer, message)?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}

fn write_fields<W: Write>(writer: &mut Writer<W>, message: &TypedMessage) -> Result<(), XmlError> {
    for field in message.descriptor().fields() {
        let Some(value) = message.get(field.name()) else {
            continue;
        };
        match value {
            Value::List(items) => {
                write_event(writer, Event::Start(BytesStart::new(field.wire_name())))?;
                for item in items {
                    write_value_element(writer, "entry", item)?;
                }
                write_event(writer, Event::End(BytesEnd::new(field.wire_name())))?;
            }
            value => write_value_element(writer, field.wire_name(), value)?,
        }
    }
    Ok(())
}

fn write_value_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> Result<(), XmlError> {
    write_event(writer, Event::Start(BytesStart::new(name)))?;
    match value {
        Value::Message(nested) => write_fields(writer, nested)?,
        Value::List(_) => {
            return Err(XmlError::Write("nested list values cannot occur".to_string()));
        }
        scalar => {
            let text = scalar_text(scalar);
            if !text.is_empty() {
                write_event(writer, Event::Text(BytesText::new(&text)))?;
            }
        }
    }
    write_event(writer, Event::End(BytesEnd::new(name)))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Float(v) => floating_text(f64::from(*v)),
        Value::Double(v) => floating_text(*v),
        Value::Bool(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Bytes(v) => BASE64.encode(v),
        Value::Enum(name) => name.clone(),
        Value::Message(_) | Value::List(_) => String::new(),
    }
}

fn floating_text(v: f64) -> String {
    if v.is_infinite() {
        return INFINITE.to_string();
    }
    if v.is_nan() {
        return NAN.to_string();
    }
    v.to_string()
}

fn write_event<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn factory() -> XmlParserFactory {
        XmlParserFactory::new(Arc::new(schema::default_registry()))
    }

    #[test]
    fn unsupported_version_is_an_error() {
        let factory = factory();
        assert!(matches!(
            factory.parser("2.0"),
            Err(XmlError::UnsupportedVersion(_))
        ));
        assert_eq!(factory.supported_versions(), vec![VERSION_1_0]);
    }

    #[test]
    fn marshal_emits_only_set_fields_in_order() {
        let factory = factory();
        let parser = factory.parser(VERSION_1_0).unwrap();
        let message = TypedMessage::builder(schema::open_channel_request())
            .set("push_sat", Value::Int64(25000))
            .unwrap()
            .set("target_conf", Value::Int32(0))
            .unwrap()
            .build();
        let xml = parser.marshal(&message).unwrap();
        assert_eq!(
            String::from_utf8(xml).unwrap(),
            "<OpenChannelRequest><push_sat>25000</push_sat><target_conf>0</target_conf></OpenChannelRequest>"
        );
    }

    #[test]
    fn pretty_print_indents() {
        let factory = factory();
        let parser = factory.parser(VERSION_1_0).unwrap();
        let message = TypedMessage::builder(schema::open_channel_request())
            .set("push_sat", Value::Int64(1))
            .unwrap()
            .build();
        let xml = String::from_utf8(parser.marshal_pretty(&message).unwrap()).unwrap();
        assert!(xml.contains('\n'));
        assert!(xml.contains("  <push_sat>"));
    }

    #[test]
    fn unmarshal_round_trips_nested_and_repeated_fields() {
        let factory = factory();
        let parser = factory.parser(VERSION_1_0).unwrap();
        let hop = TypedMessage::builder(schema::hop_hint())
            .set("node_id", Value::String("02abc".to_string()))
            .unwrap()
            .set("chan_id", Value::Int64(42))
            .unwrap()
            .build();
        let hint = TypedMessage::builder(schema::route_hint())
            .set("hop_hints", Value::List(vec![Value::Message(hop)]))
            .unwrap()
            .build();
        let message = TypedMessage::builder(schema::invoice())
            .set("memo", Value::String("coffee & cake".to_string()))
            .unwrap()
            .set("value", Value::Int64(1500))
            .unwrap()
            .set("state", Value::Enum("OPEN".to_string()))
            .unwrap()
            .set("route_hints", Value::List(vec![Value::Message(hint)]))
            .unwrap()
            .build();

        let xml = parser.marshal(&message).unwrap();
        let parsed = parser.unmarshal(&xml).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn unknown_root_element_fails() {
        let factory = factory();
        let parser = factory.parser(VERSION_1_0).unwrap();
        let err = parser.unmarshal(b"<NoSuchMessage/>").unwrap_err();
        assert!(matches!(err, XmlError::UnknownRootType(_)));
    }

    #[test]
    fn unknown_field_element_fails() {
        let factory = factory();
        let parser = factory.parser(VERSION_1_0).unwrap();
        let err = parser
            .unmarshal(b"<Invoice><bogus>1</bogus></Invoice>")
            .unwrap_err();
        assert!(matches!(err, XmlError::UnexpectedElement { .. }));
    }

    #[test]
    fn unknown_entry_element_fails() {
        let factory = factory();
        let parser = factory.parser(VERSION_1_0).unwrap();
        let err = parser
            .unmarshal(b"<Invoice><route_hints><bogus/></route_hints></Invoice>")
            .unwrap_err();
        assert!(matches!(
            err,
            XmlError::UnexpectedElement { message: "Invoice", .. }
        ));
    }

    #[test]
    fn category_invalid_text_fails() {
        let factory = factory();
        let parser = factory.parser(VERSION_1_0).unwrap();
        let err = parser
            .unmarshal(b"<Invoice><value>not-a-number</value></Invoice>")
            .unwrap_err();
        assert!(matches!(err, XmlError::InvalidText { .. }));
    }
}
