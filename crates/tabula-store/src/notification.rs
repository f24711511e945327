//! Save notifications
//!
//! Emitted once per successful save call, synchronously, after the
//! transaction has committed.

use std::collections::BTreeSet;

use serde::Serialize;
use tabula_core::StorageRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveNotification {
    /// Type names of every saved object
    pub saved_classes: BTreeSet<String>,
    /// Snapshot of each saved object in save order, keys included
    pub saved_objects: Vec<StorageRecord>,
}

pub type SaveObserver = Box<dyn Fn(&SaveNotification) + Send + Sync>;
