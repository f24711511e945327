//! Error helpers for tabula-store
//!
//! Wrap engine failures into the core taxonomy with operation and type
//! context attached.

use tabula_core::errors::TabulaError;

/// Engine failure during `op` against `type_name`
pub fn from_rusqlite(op: &str, type_name: &str, err: rusqlite::Error) -> TabulaError {
    TabulaError::StorageExecution {
        op: op.to_string(),
        type_name: type_name.to_string(),
        message: err.to_string(),
    }
}

/// Engine failure inside a save transaction; the batch has been rolled back
pub fn transaction_aborted(table: &str, err: rusqlite::Error) -> TabulaError {
    TabulaError::TransactionAborted {
        message: format!("write to {} failed: {}", table, err),
    }
}

pub fn queue_unavailable(reason: impl std::fmt::Display) -> TabulaError {
    TabulaError::QueueUnavailable {
        message: reason.to_string(),
    }
}

pub fn config_error(reason: impl std::fmt::Display) -> TabulaError {
    TabulaError::Config {
        message: reason.to_string(),
    }
}
