//! Storable object declaration surface

use serde::Serialize;

use crate::errors::{Result, TabulaError};
use crate::materializer;
use crate::model::property::{FetchedPropertyDescriptor, PropertyDescriptor};
use crate::model::value::Value;
use crate::registry::PropertyRegistry;

/// Primary key slot of a storable object
///
/// Unassigned until the first successful insert; once assigned it can only be
/// re-assigned to the same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PrimaryKey(Option<i64>);

impl PrimaryKey {
    /// Key of a row that already exists in the store
    pub fn existing(key: i64) -> Self {
        PrimaryKey(Some(key))
    }

    pub fn get(&self) -> Option<i64> {
        self.0
    }

    pub fn is_assigned(&self) -> bool {
        self.0.is_some()
    }

    pub fn assign(&mut self, key: i64) -> Result<()> {
        match self.0 {
            Some(existing) if existing != key => Err(TabulaError::PrimaryKeyReassigned {
                existing,
                attempted: key,
            }),
            _ => {
                self.0 = Some(key);
                Ok(())
            }
        }
    }
}

/// Getter returning the property as a typed [`Value`]
pub type Getter<T> = fn(&T) -> Value;

/// Setter receiving a decoded [`Value`]
pub type Setter<T> = fn(&mut T, Value) -> Result<()>;

/// Accessor pair for one native property of `T`
pub struct PropertyAccessor<T> {
    property_name: &'static str,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> PropertyAccessor<T> {
    pub fn new(property_name: &'static str, get: Getter<T>, set: Setter<T>) -> Self {
        Self {
            property_name,
            get,
            set,
        }
    }

    pub fn property_name(&self) -> &'static str {
        self.property_name
    }

    pub fn read(&self, object: &T) -> Value {
        (self.get)(object)
    }

    pub fn write(&self, object: &mut T, value: Value) -> Result<()> {
        (self.set)(object, value)
    }
}

/// A type that can be persisted by the storage layer
///
/// Implementors declare their metadata statically and supply an accessor
/// for every native property. `Default` provides the blank instance that
/// hydration fills in.
pub trait StorageObject: Default + 'static {
    /// Registry key of the type
    const TYPE_NAME: &'static str;

    fn table_name() -> &'static str;

    /// Native properties in declaration order
    fn property_descriptors() -> Vec<PropertyDescriptor>;

    fn primary_key_descriptor() -> PropertyDescriptor {
        PropertyDescriptor::default_primary_key()
    }

    fn fetched_property_descriptors() -> Vec<FetchedPropertyDescriptor> {
        Vec::new()
    }

    /// One accessor per native property
    fn accessors() -> Vec<PropertyAccessor<Self>>;

    fn primary_key(&self) -> &PrimaryKey;

    fn primary_key_mut(&mut self) -> &mut PrimaryKey;

    /// Runs on a blank instance before hydration assigns any value
    fn will_load_values(&mut self) {}

    /// Runs after every value and the primary key are assigned
    fn did_load_values(&mut self) {}

    fn is_in_storage(&self) -> bool {
        self.primary_key().is_assigned()
    }
}

/// Detached snapshot of one object's persisted state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageRecord {
    pub type_name: String,
    pub primary_key: Option<i64>,
    /// Encoded native values in registry order
    pub values: Vec<Value>,
}

/// Object-safe view of a [`StorageObject`] used for heterogeneous batches
pub trait AnyStorageObject {
    fn type_name(&self) -> &'static str;

    /// Register the object's type (if needed) and snapshot its native values
    fn to_record(&self, registry: &PropertyRegistry) -> Result<StorageRecord>;

    fn assign_primary_key(&mut self, key: i64) -> Result<()>;
}

impl<T: StorageObject> AnyStorageObject for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn to_record(&self, registry: &PropertyRegistry) -> Result<StorageRecord> {
        let entry = registry.entry_for::<T>()?;
        Ok(StorageRecord {
            type_name: T::TYPE_NAME.to_string(),
            primary_key: self.primary_key().get(),
            values: materializer::dehydrate(self, &entry, false)?,
        })
    }

    fn assign_primary_key(&mut self, key: i64) -> Result<()> {
        self.primary_key_mut().assign(key)
    }
}
