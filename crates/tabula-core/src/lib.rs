//! Tabula Core - object mapping kernel
//!
//! Storage-independent half of the persistence layer:
//! - Property descriptors and the per-type registry
//! - The closed predicate tree and its compiler to parameterized SQL clauses
//! - Row <-> object materialization with load hooks
//! - The error taxonomy and the structured logging facility

pub mod errors;
pub mod expr;
pub mod logging_facility;
pub mod materializer;
pub mod model;
pub mod registry;

pub use tabula_core_types::schema;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, TabulaError};
pub use expr::{compile, CompiledClause, Expression, NameMapping, Operator, SortDescriptor};
pub use model::{
    ArgSource, Cardinality, FetchedPropertyDescriptor, FromValue, PrimaryKey, PrimitiveType,
    PropertyAccessor, PropertyDescriptor, StorageObject, StorageRecord, TemplateArg, Value,
};
pub use registry::{PropertyRegistry, TypeEntry};
