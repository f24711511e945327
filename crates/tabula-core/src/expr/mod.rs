//! Predicate expressions and their compilation into SQL clauses

pub mod compiler;
pub mod expression;

use std::collections::HashMap;

use crate::errors::{Result, TabulaError};

pub use compiler::{compile, compile_order_by, quote_identifier, CompiledClause, SortDescriptor};
pub use expression::{Comparison, Compound, Connector, Expression, Operator};

/// Resolves property names (key paths) to storage field names
pub trait NameMapping {
    fn storage_field(&self, property_name: &str) -> Result<&str>;
}

impl NameMapping for HashMap<String, String> {
    fn storage_field(&self, property_name: &str) -> Result<&str> {
        self.get(property_name)
            .map(String::as_str)
            .ok_or_else(|| TabulaError::UnknownProperty {
                type_name: "<mapping>".to_string(),
                name: property_name.to_string(),
            })
    }
}
