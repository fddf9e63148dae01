//! # Required-Field Validator
//!
//! Recursive descent over a message's **required** fields, producing a tree
//! of [`ValidationResult`]s that mirrors the message nesting. Optional
//! fields, even message-typed ones with required sub-fields of their own,
//! are never inspected.

use crate::descriptor::{Cardinality, TypeCategory};
use crate::message::{TypedMessage, Value};

/// Problem code attached to every required-field violation.
pub const FIELD_IS_REQUIRED: &str = "lnwrap.validation.field_is_required";

/// A single validation problem found in a message.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationProblem {
    message_type: &'static str,
    field: &'static str,
    code: &'static str,
    description: String,
    args: Vec<String>,
}

impl ValidationProblem {
    fn required(message_type: &'static str, field: &'static str) -> Self {
        Self {
            message_type,
            field,
            code: FIELD_IS_REQUIRED,
            description: format!("Field {field} is required."),
            args: vec![field.to_string()],
        }
    }

    /// The type of message that contained the problem.
    pub fn message_type(&self) -> &'static str {
        self.message_type
    }

    /// The field that contained the problem.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// A stable problem code suitable for translation lookup.
    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Format arguments for locale substitution of [`Self::code`].
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// The outcome of validating one message.
///
/// Holds this message's direct problems plus the results of required
/// message-typed children that failed their own validation; valid children
/// are never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    message_type: &'static str,
    problems: Vec<ValidationProblem>,
    children: Vec<ValidationResult>,
}

impl ValidationResult {
    /// True if no problems were found in this message or any sub-message.
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty() && self.children.is_empty()
    }

    pub fn message_type(&self) -> &'static str {
        self.message_type
    }

    /// This message's own problems; sub-message problems are not included.
    pub fn problems(&self) -> &[ValidationProblem] {
        &self.problems
    }

    /// Validation results of sub-messages that were themselves invalid.
    pub fn children(&self) -> &[ValidationResult] {
        &self.children
    }

    /// Flattens the tree into an ordered problem list: this message's
    /// problems first, then each child's flattened problems, in field order.
    pub fn flatten(&self) -> Vec<&ValidationProblem> {
        let mut all = Vec::new();
        self.collect(&mut all);
        all
    }

    fn collect<'a>(&'a self, into: &mut Vec<&'a ValidationProblem>) {
        into.extend(self.problems.iter());
        for child in &self.children {
            child.collect(into);
        }
    }

    /// Renders the result tree as a JSON array for diagnostics: one
    /// `{field: description}` object per problem, then one
    /// `{child type: [...]}` object per invalid sub-message.
    pub fn to_json(&self) -> serde_json::Value {
        let mut entries = Vec::new();
        for problem in &self.problems {
            let mut object = serde_json::Map::new();
            object.insert(
                problem.field().to_string(),
                serde_json::Value::from(problem.description()),
            );
            entries.push(serde_json::Value::Object(object));
        }
        for child in &self.children {
            let mut object = serde_json::Map::new();
            object.insert(child.message_type().to_string(), child.to_json());
            entries.push(serde_json::Value::Object(object));
        }
        serde_json::Value::Array(entries)
    }
}

/// Error carrying the full [`ValidationResult`] tree of an invalid message.
#[derive(Debug, thiserror::Error)]
#[error("validation problems in message '{}'", .result.message_type())]
pub struct ValidationError {
    result: ValidationResult,
}

impl ValidationError {
    pub fn new(result: ValidationResult) -> Self {
        Self { result }
    }

    pub fn result(&self) -> &ValidationResult {
        &self.result
    }
}

/// Validates a message's required fields.
///
/// A required singular field must be set; a required repeated or map field
/// must hold at least one element; a required message-typed field must
/// additionally pass its own recursive validation.
pub fn validate(message: &TypedMessage) -> ValidationResult {
    let descriptor = message.descriptor();
    let mut result = ValidationResult {
        message_type: descriptor.name(),
        problems: Vec::new(),
        children: Vec::new(),
    };
    for field in descriptor.fields() {
        if !field.is_required() {
            continue;
        }
        match message.get(field.name()) {
            None => {
                result
                    .problems
                    .push(ValidationProblem::required(descriptor.name(), field.name()));
            }
            Some(Value::List(items)) if items.is_empty() => {
                result
                    .problems
                    .push(ValidationProblem::required(descriptor.name(), field.name()));
            }
            Some(value) => {
                let singular_message = matches!(field.category(), TypeCategory::Message(_))
                    && field.cardinality() == Cardinality::Singular;
                if singular_message {
                    if let Value::Message(nested) = value {
                        let child = validate(nested);
                        if !child.is_valid() {
                            result.children.push(child);
                        }
                    }
                }
            }
        }
    }
    result
}
