//! Row <-> object materialization
//!
//! Dehydration reads native properties through the type's accessor table in
//! registry order and encodes them into SQLite storage classes. Hydration is
//! the inverse and always brackets value assignment with the type's
//! `will_load_values` / `did_load_values` hooks.
//!
//! Encoding per primitive type:
//!
//! | type    | stored as                         |
//! |---------|-----------------------------------|
//! | String  | TEXT                              |
//! | Date    | REAL, epoch seconds (µs precision) |
//! | Blob    | BLOB                              |
//! | Boolean | INTEGER 0/1                       |
//! | Integer | INTEGER                           |
//! | Float   | REAL                              |

use chrono::{DateTime, Utc};

use crate::errors::{Result, TabulaError};
use crate::model::{PrimitiveType, PropertyAccessor, PropertyDescriptor, StorageObject, Value};
use crate::registry::TypeEntry;

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Encode a typed value into its storage class.
///
/// Self-describing: used for compiled predicate arguments, which carry no
/// descriptor.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Date(date) => Value::Float(
            date.timestamp() as f64
                + f64::from(date.timestamp_subsec_micros()) / MICROS_PER_SECOND as f64,
        ),
        Value::Boolean(b) => Value::Integer(i64::from(*b)),
        other => other.clone(),
    }
}

/// Check a value against its declared type, then encode it
pub fn encode_for(descriptor: &PropertyDescriptor, value: &Value) -> Result<Value> {
    let accepted = matches!(
        (descriptor.primitive_type(), value),
        (_, Value::Null)
            | (PrimitiveType::String, Value::Text(_))
            | (PrimitiveType::Date, Value::Date(_))
            | (PrimitiveType::Blob, Value::Blob(_))
            | (PrimitiveType::Boolean, Value::Boolean(_))
            | (PrimitiveType::Integer, Value::Integer(_))
            | (PrimitiveType::Float, Value::Float(_) | Value::Integer(_))
    );
    if !accepted {
        return Err(mismatch(descriptor, value));
    }
    Ok(match (descriptor.primitive_type(), value) {
        (PrimitiveType::Float, Value::Integer(i)) => Value::Float(*i as f64),
        _ => encode(value),
    })
}

/// Decode a stored value into the typed value for its declared property
pub fn decode(descriptor: &PropertyDescriptor, raw: Value) -> Result<Value> {
    match (descriptor.primitive_type(), raw) {
        (_, Value::Null) => Ok(Value::Null),
        (PrimitiveType::String, Value::Text(s)) => Ok(Value::Text(s)),
        (PrimitiveType::Blob, Value::Blob(b)) => Ok(Value::Blob(b)),
        (PrimitiveType::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
        (PrimitiveType::Float, Value::Float(f)) => Ok(Value::Float(f)),
        (PrimitiveType::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
        (PrimitiveType::Boolean, Value::Integer(i)) => Ok(Value::Boolean(i != 0)),
        (PrimitiveType::Date, Value::Float(secs)) => date_from_seconds(descriptor, secs),
        (PrimitiveType::Date, Value::Integer(secs)) => date_from_seconds(descriptor, secs as f64),
        (_, raw) => Err(mismatch(descriptor, &raw)),
    }
}

fn date_from_seconds(descriptor: &PropertyDescriptor, secs: f64) -> Result<Value> {
    let micros = (secs * MICROS_PER_SECOND as f64).round() as i64;
    let nanos = (micros.rem_euclid(MICROS_PER_SECOND) * 1_000) as u32;
    DateTime::<Utc>::from_timestamp(micros.div_euclid(MICROS_PER_SECOND), nanos)
        .map(Value::Date)
        .ok_or_else(|| mismatch(descriptor, &Value::Float(secs)))
}

fn mismatch(descriptor: &PropertyDescriptor, found: &Value) -> TabulaError {
    TabulaError::ValueTypeMismatch {
        property: descriptor.property_name().to_string(),
        expected: format!("{:?}", descriptor.primitive_type()),
        found: found.type_label().to_string(),
    }
}

fn accessor_for<'a, T>(
    entry: &TypeEntry,
    accessors: &'a [PropertyAccessor<T>],
    property_name: &str,
) -> Result<&'a PropertyAccessor<T>> {
    accessors
        .iter()
        .find(|a| a.property_name() == property_name)
        .ok_or_else(|| TabulaError::UnknownProperty {
            type_name: entry.type_name().to_string(),
            name: property_name.to_string(),
        })
}

/// Encoded native values of `object` in registry order, optionally followed
/// by the primary key (`Null` when unsaved).
pub fn dehydrate<T: StorageObject>(
    object: &T,
    entry: &TypeEntry,
    include_primary_key: bool,
) -> Result<Vec<Value>> {
    let accessors = T::accessors();
    let mut values = entry
        .ordered_properties(false)
        .into_iter()
        .map(|descriptor| {
            let accessor = accessor_for(entry, &accessors, descriptor.property_name())?;
            encode_for(descriptor, &accessor.read(object))
        })
        .collect::<Result<Vec<_>>>()?;
    if include_primary_key {
        values.push(object.primary_key().get().into());
    }
    Ok(values)
}

/// Build a `T` from stored values laid out as `ordered_fields(true)`.
pub fn hydrate<T: StorageObject>(entry: &TypeEntry, raw_values: Vec<Value>) -> Result<T> {
    let descriptors = entry.ordered_properties(true);
    if raw_values.len() != descriptors.len() {
        return Err(TabulaError::ValueTypeMismatch {
            property: format!("<row of {}>", entry.type_name()),
            expected: format!("{} values", descriptors.len()),
            found: format!("{} values", raw_values.len()),
        });
    }

    let accessors = T::accessors();
    let mut object = T::default();
    object.will_load_values();

    let (native, key) = descriptors.split_at(descriptors.len() - 1);
    let mut raw_values = raw_values.into_iter();
    for descriptor in native {
        let raw = raw_values.next().unwrap_or_default();
        let accessor = accessor_for(entry, &accessors, descriptor.property_name())?;
        accessor.write(&mut object, decode(descriptor, raw)?)?;
    }

    match raw_values.next().unwrap_or_default() {
        Value::Integer(primary_key) => object.primary_key_mut().assign(primary_key)?,
        other => return Err(mismatch(key[0], &other)),
    }

    object.did_load_values();
    Ok(object)
}
