//! Lazily resolved relationship fields
//!
//! A [`Fetched`] sits on the owning object in place of the related values.
//! The first read resolves the fetched property through the storage layer;
//! later reads on the same instance return the cached result without issuing
//! a query. Racing first reads may each query, but only one result is kept.
//! Reads that need the key of an unsaved owner return nothing and leave the
//! cache empty, so the first read after saving still queries.

use std::fmt;
use std::sync::OnceLock;

use tabula_core::{Cardinality, Result, StorageObject};

use crate::storage::StorageLayer;

pub struct Fetched<T> {
    cache: OnceLock<Vec<T>>,
}

impl<T> Fetched<T> {
    pub fn new() -> Self {
        Self {
            cache: OnceLock::new(),
        }
    }

    /// Whether a previous read has populated the cache
    pub fn is_resolved(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl<T: StorageObject> Fetched<T> {
    /// Read a `OneToOne` property; `None` when no row matches
    pub fn one<O: StorageObject>(
        &self,
        layer: &StorageLayer,
        owner: &O,
        property_name: &str,
    ) -> Result<Option<&T>> {
        let values = self.resolve(layer, owner, property_name, Cardinality::OneToOne)?;
        Ok(values.first())
    }

    /// Read a `OneToMany` property
    pub fn many<O: StorageObject>(
        &self,
        layer: &StorageLayer,
        owner: &O,
        property_name: &str,
    ) -> Result<&[T]> {
        self.resolve(layer, owner, property_name, Cardinality::OneToMany)
    }

    fn resolve<O: StorageObject>(
        &self,
        layer: &StorageLayer,
        owner: &O,
        property_name: &str,
        cardinality: Cardinality,
    ) -> Result<&[T]> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached.as_slice());
        }
        match layer.resolve_bound::<O, T>(owner, property_name, cardinality)? {
            Some(resolved) => Ok(self.cache.get_or_init(|| resolved).as_slice()),
            None => Ok(&[]),
        }
    }
}

impl<T> Default for Fetched<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Fetched<T> {
    fn clone(&self) -> Self {
        let cache = OnceLock::new();
        if let Some(values) = self.cache.get() {
            let _ = cache.set(values.clone());
        }
        Self { cache }
    }
}

impl<T: fmt::Debug> fmt::Debug for Fetched<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cache.get() {
            Some(values) => f.debug_tuple("Fetched").field(values).finish(),
            None => f.write_str("Fetched(<unresolved>)"),
        }
    }
}
