//! # Schema Descriptor Model
//!
//! Static, immutable metadata describing the daemon's message types. A
//! [`MessageDescriptor`] holds an ordered field list; declaration order is
//! authoritative for both encode and validate traversal. Descriptors are
//! built once (typically inside `LazyLock` statics, see [`crate::schema`])
//! and shared read-only across concurrent calls.

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
    /// Map fields reference a synthetic two-field entry descriptor (key field
    /// then value field) through their [`TypeCategory::Message`] category.
    Map,
}

/// The type category of a field value.
#[derive(Debug, Clone, Copy)]
pub enum TypeCategory {
    Int32,
    Int64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    Enum(&'static EnumDescriptor),
    Message(&'static MessageDescriptor),
}

impl TypeCategory {
    /// A short human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            TypeCategory::Int32 => "int32",
            TypeCategory::Int64 => "int64",
            TypeCategory::Float => "float",
            TypeCategory::Double => "double",
            TypeCategory::Bool => "bool",
            TypeCategory::String => "string",
            TypeCategory::Bytes => "bytes",
            TypeCategory::Enum(_) => "enum",
            TypeCategory::Message(_) => "message",
        }
    }
}

/// Descriptor of a single field within a message type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    json_name: &'static str,
    category: TypeCategory,
    cardinality: Cardinality,
    required: bool,
}

impl FieldDescriptor {
    /// Creates a singular, optional field.
    pub fn singular(name: &'static str, category: TypeCategory) -> Self {
        Self {
            name,
            json_name: name,
            category,
            cardinality: Cardinality::Singular,
            required: false,
        }
    }

    /// Creates a repeated, optional field.
    pub fn repeated(name: &'static str, category: TypeCategory) -> Self {
        Self {
            name,
            json_name: name,
            category,
            cardinality: Cardinality::Repeated,
            required: false,
        }
    }

    /// Creates a map field backed by the given synthetic entry descriptor.
    /// The entry descriptor carries the key field and the value field, in
    /// that order.
    pub fn map(name: &'static str, entry: &'static MessageDescriptor) -> Self {
        Self {
            name,
            json_name: name,
            category: TypeCategory::Message(entry),
            cardinality: Cardinality::Map,
            required: false,
        }
    }

    /// Marks the field as required for validation purposes.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Overrides the json/wire name when it differs from the declared name.
    pub fn json_name(mut self, json_name: &'static str) -> Self {
        self.json_name = json_name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The key used for this field in JSON payloads and XML elements.
    pub fn wire_name(&self) -> &'static str {
        self.json_name
    }

    pub fn category(&self) -> TypeCategory {
        self.category
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The nested message descriptor for message and map fields.
    pub fn nested_message(&self) -> Option<&'static MessageDescriptor> {
        match self.category {
            TypeCategory::Message(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

/// Descriptor of a message type: its name plus the ordered field list.
#[derive(Debug)]
pub struct MessageDescriptor {
    name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn new(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks a field up by its json/wire name.
    pub fn field_by_wire_name(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.json_name == wire_name)
    }
}

/// Descriptor of an enum type and its declared value names.
#[derive(Debug)]
pub struct EnumDescriptor {
    name: &'static str,
    values: &'static [&'static str],
}

impl EnumDescriptor {
    pub const fn new(name: &'static str, values: &'static [&'static str]) -> Self {
        Self { name, values }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn values(&self) -> &'static [&'static str] {
        self.values
    }

    /// Returns true if `value` is one of the declared symbolic names.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| *v == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLOR: EnumDescriptor = EnumDescriptor {
        name: "Color",
        values: &["RED", "GREEN"],
    };

    #[test]
    fn field_lookup_uses_declared_and_wire_names() {
        let descriptor = MessageDescriptor::new(
            "Sample",
            vec![
                FieldDescriptor::singular("amount", TypeCategory::Int64),
                FieldDescriptor::singular("color", TypeCategory::Enum(&COLOR)).json_name("colour"),
            ],
        );

        assert_eq!(descriptor.field("amount").unwrap().wire_name(), "amount");
        assert!(descriptor.field_by_wire_name("colour").is_some());
        assert!(descriptor.field_by_wire_name("color").is_none());
        assert!(descriptor.field("missing").is_none());
    }

    #[test]
    fn enum_membership() {
        assert!(COLOR.contains("RED"));
        assert!(!COLOR.contains("BLUE"));
    }
}
