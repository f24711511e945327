//! Dynamic property values
//!
//! [`Value`] is what accessors hand to the materializer and what the compiler
//! binds as arguments. Typed variants (`Date`, `Boolean`) are encoded into the
//! SQLite storage classes by the materializer before they reach the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TabulaError};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Date(DateTime<Utc>),
    Blob(Vec<u8>),
    Boolean(bool),
    Integer(i64),
    Float(f64),
}

impl Value {
    /// Variant name, used in mismatch errors
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Blob(_) => "blob",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion out of a decoded [`Value`] into a concrete field type.
///
/// Used by accessor setters; `property` only feeds the error message.
pub trait FromValue: Sized {
    fn from_value(property: &str, value: Value) -> Result<Self>;
}

fn mismatch(property: &str, expected: &str, value: &Value) -> TabulaError {
    TabulaError::ValueTypeMismatch {
        property: property.to_string(),
        expected: expected.to_string(),
        found: value.type_label().to_string(),
    }
}

impl FromValue for String {
    fn from_value(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(property, "text", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(mismatch(property, "date", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Blob(b) => Ok(b),
            other => Err(mismatch(property, "blob", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch(property, "boolean", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(mismatch(property, "integer", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(mismatch(property, "float", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(property, other).map(Some),
        }
    }
}
