//! SQL statement builders and value conversion
//!
//! Statements are derived from a [`TypeEntry`]; column lists always follow
//! the registry's field ordering so positional values line up.

use rusqlite::types::{Value as SqlValue, ValueRef};
use tabula_core::expr::quote_identifier;
use tabula_core::materializer;
use tabula_core::{TypeEntry, Value};

/// `CREATE TABLE IF NOT EXISTS` with the primary key as an autoincrement
/// rowid column; fetched properties get no column
pub fn create_table(entry: &TypeEntry) -> String {
    let mut columns = vec![format!(
        "{} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote_identifier(entry.primary_key().storage_field_name())
    )];
    for descriptor in entry.ordered_properties(false) {
        if let Some(column_type) = descriptor.primitive_type().column_type() {
            columns.push(format!(
                "{} {}",
                quote_identifier(descriptor.storage_field_name()),
                column_type
            ));
        }
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(entry.table_name()),
        columns.join(", ")
    )
}

fn column_list(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| quote_identifier(f))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Insert of the native fields; the engine assigns the key
pub fn insert(entry: &TypeEntry) -> String {
    let fields = entry.ordered_fields(false);
    let table = quote_identifier(entry.table_name());
    if fields.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table);
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        column_list(&fields),
        placeholders(fields.len())
    )
}

/// Write of an object with a known key: native fields then the key.
///
/// Updates the existing row, or recreates it under the same key if it is
/// gone.
pub fn update(entry: &TypeEntry) -> String {
    let fields = entry.ordered_fields(true);
    let key = quote_identifier(entry.primary_key().storage_field_name());
    let assignments = entry
        .ordered_fields(false)
        .into_iter()
        .map(|f| {
            let column = quote_identifier(f);
            format!("{} = excluded.{}", column, column)
        })
        .collect::<Vec<_>>();
    let conflict = if assignments.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", assignments.join(", "))
    };
    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
        quote_identifier(entry.table_name()),
        column_list(&fields),
        placeholders(fields.len()),
        key,
        conflict
    )
}

/// Select every stored field (key last), with optional clause suffixes
pub fn select(entry: &TypeEntry, where_clause: Option<&str>, order_by: &str, limit: Option<usize>) -> String {
    let mut sql = format!(
        "SELECT {} FROM {}",
        column_list(&entry.ordered_fields(true)),
        quote_identifier(entry.table_name())
    );
    if let Some(clause) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    if !order_by.is_empty() {
        sql.push(' ');
        sql.push_str(order_by);
    }
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    sql
}

/// Encode a value for binding
pub fn to_sql(value: &Value) -> SqlValue {
    match materializer::encode(value) {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(i),
        Value::Float(f) => SqlValue::Real(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
        // encode() never yields typed variants
        Value::Boolean(b) => SqlValue::Integer(i64::from(b)),
        Value::Date(d) => SqlValue::Real(d.timestamp() as f64),
    }
}

/// Read a column into its raw storage-class value
pub fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}
