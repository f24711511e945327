//! Field keys and event names of Tabula's structured logs
//!
//! The `log_op_*` macros write these keys literally (tracing needs field
//! names at compile time); the constants are what readers of the logs, and
//! the capture assertions in tests, match against.

/// Emitting module path
pub const FIELD_COMPONENT: &str = "component";
/// Operation name, e.g. `save` or `fetch_matching`
pub const FIELD_OP: &str = "op";
/// One of [`EVENT_START`], [`EVENT_END`], [`EVENT_END_ERROR`]
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

pub const FIELD_TYPE_NAME: &str = "type_name";
pub const FIELD_TABLE: &str = "table";
pub const FIELD_OBJECT_COUNT: &str = "object_count";
pub const FIELD_ROW_COUNT: &str = "row_count";
pub const FIELD_ARG_COUNT: &str = "arg_count";

/// Debug rendering of the error kind
pub const FIELD_ERR_KIND: &str = "err.kind";
/// Stable `ERR_*` code
pub const FIELD_ERR_CODE: &str = "err.code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
