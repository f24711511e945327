//! Tabula Store - SQLite-backed storage layer
//!
//! Provides:
//! - Store configuration and connection setup
//! - A single-worker execution queue that serializes every statement
//! - SQL statement builders derived from the property registry
//! - The [`StorageLayer`]: table creation, transactional batch save, and
//!   fetch by primary key, value map, predicate, or raw query
//! - Lazily resolved, per-instance cached relationships ([`Fetched`])
//! - Save notifications

pub mod config;
pub mod db;
pub mod errors;
pub mod notification;
pub mod queue;
pub mod relationship;
pub mod sql;
pub mod storage;

// Re-export key types
pub use config::{JournalMode, StoreConfig};
pub use notification::SaveNotification;
pub use queue::ExecutionQueue;
pub use relationship::Fetched;
pub use storage::{QueryStats, StorageLayer};
pub use tabula_core::Result;
