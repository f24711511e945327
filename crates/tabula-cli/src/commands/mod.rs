pub mod compile;
pub mod query;

use serde_json::Value as Json;
use tabula_core::Value;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Plain JSON rendering of a value; dates as RFC 3339, blobs as byte arrays
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Text(s) => Json::String(s.clone()),
        Value::Date(d) => Json::String(d.to_rfc3339()),
        Value::Blob(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
    }
}

/// Parse a command-line argument: JSON scalars keep their type, anything
/// else binds as text
pub fn parse_arg(raw: &str) -> Value {
    match serde_json::from_str::<Json>(raw) {
        Ok(Json::Null) => Value::Null,
        Ok(Json::Bool(b)) => Value::Boolean(b),
        Ok(Json::Number(n)) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        Ok(Json::String(s)) => Value::Text(s),
        _ => Value::Text(raw.to_string()),
    }
}
