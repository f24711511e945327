//! Operation logging macros
//!
//! Storage operations bracket their work with one `start` event and exactly
//! one `end` or `end_error` event, all carrying `component` and `op`.

#[doc(hidden)]
#[macro_export]
macro_rules! __tabula_op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)+)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event
            $(, $($field)+)?
        )
    };
}

/// Start of an operation, with optional extra fields
///
/// ```
/// # use tabula_core::log_op_start;
/// log_op_start!("fetch_all");
/// log_op_start!("fetch_all", type_name = "Note", arg_count = 0usize);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        $crate::__tabula_op_event!(info, $op, $crate::schema::EVENT_START $(, $($field)+)?)
    };
}

/// Successful end of an operation; `duration_ms` is required
///
/// ```
/// # use tabula_core::log_op_end;
/// log_op_end!("fetch_all", duration_ms = 3u64, row_count = 12usize);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        $crate::__tabula_op_event!(
            info,
            $op,
            $crate::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)+)?
        )
    };
}

/// Failed end of an operation
///
/// The error is converted into an [`ExError`](crate::errors::ExError) and
/// logged by kind and stable code.
///
/// ```
/// # use tabula_core::{log_op_error, errors::TabulaError};
/// let err = TabulaError::UnregisteredType { type_name: "Note".to_string() };
/// log_op_error!("fetch_all", err, duration_ms = 1u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = ::core::convert::Into::into($err);
        $crate::__tabula_op_event!(
            error,
            $op,
            $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code()
            $(, $($field)+)?
        )
    }};
}
