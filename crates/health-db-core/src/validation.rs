//! Input validation for untrusted JSON payloads.
//!
//! A [`Schema`] lists required keys with the [`FieldType`] each must carry.
//! [`validate`] walks the schema in declaration order and, for each key,
//! checks presence before type, so the first failing key decides the error.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Semantic type of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Integral number (`65`, `-3`); `65.0` is not an integer.
    Int,
    /// Non-integral number
    Float,
    Str,
    Bool,
    List,
    Map,
    Null,
}

impl FieldType {
    /// Classify a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Int,
            Value::Number(_) => FieldType::Float,
            Value::String(_) => FieldType::Str,
            Value::Array(_) => FieldType::List,
            Value::Object(_) => FieldType::Map,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "str",
            FieldType::Bool => "bool",
            FieldType::List => "list",
            FieldType::Map => "dict",
            FieldType::Null => "null",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The input was not a dictionary.")]
    NotAMapping,

    #[error("The key {0} is missing from input")]
    MissingField(String),

    #[error("The key {field} has the wrong data type (expected {expected}, found {actual})")]
    WrongType {
        field: String,
        expected: FieldType,
        actual: FieldType,
    },
}

/// Ordered set of required keys and their types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<(String, FieldType)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field. Redeclaring a key replaces its type but keeps
    /// its original position.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = field_type,
            None => self.fields.push((name, field_type)),
        }
        self
    }

    /// Schema for the `new_patient` payload.
    pub fn new_patient() -> Self {
        Self::new()
            .field("name", FieldType::Str)
            .field("id", FieldType::Int)
            .field("blood_type", FieldType::Str)
    }

    /// Schema for the `add_test` payload.
    pub fn add_test() -> Self {
        Self::new()
            .field("id", FieldType::Int)
            .field("test_name", FieldType::Str)
            .field("test_result", FieldType::Int)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }
}

/// Validate `payload` against `schema`.
///
/// Returns the payload's map unchanged on success. Keys not named by the
/// schema are ignored.
pub fn validate<'a>(
    payload: &'a Value,
    schema: &Schema,
) -> Result<&'a Map<String, Value>, ValidationError> {
    let map = payload.as_object().ok_or(ValidationError::NotAMapping)?;

    for (name, expected) in schema.fields() {
        let value = map
            .get(name)
            .ok_or_else(|| ValidationError::MissingField(name.to_string()))?;
        let actual = FieldType::of(value);
        if actual != expected {
            return Err(ValidationError::WrongType {
                field: name.to_string(),
                expected,
                actual,
            });
        }
    }

    Ok(map)
}
