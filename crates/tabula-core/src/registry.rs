//! Property metadata registry
//!
//! One [`TypeEntry`] per registered type, built and validated once, then shared
//! read-only. Field ordering is declaration order with the primary key last;
//! the materializer and the storage layer rely on it for positional values.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::errors::{Result, TabulaError};
use crate::expr::NameMapping;
use crate::model::{FetchedPropertyDescriptor, PrimitiveType, PropertyDescriptor, StorageObject};

/// Cached metadata for one registered type
#[derive(Debug)]
pub struct TypeEntry {
    type_name: String,
    table_name: String,
    properties: Vec<PropertyDescriptor>,
    primary_key: PropertyDescriptor,
    fetched: Vec<FetchedPropertyDescriptor>,
    by_property: HashMap<String, PropertyDescriptor>,
    by_field: HashMap<String, PropertyDescriptor>,
}

impl TypeEntry {
    fn build(
        type_name: &str,
        table_name: &str,
        properties: Vec<PropertyDescriptor>,
        primary_key: PropertyDescriptor,
        fetched: Vec<FetchedPropertyDescriptor>,
    ) -> Result<Self> {
        if primary_key.primitive_type() != PrimitiveType::Integer {
            return Err(TabulaError::ValueTypeMismatch {
                property: primary_key.property_name().to_string(),
                expected: "integer primary key".to_string(),
                found: format!("{:?}", primary_key.primitive_type()),
            });
        }
        if let Some(virtual_prop) = properties.iter().find(|p| p.primitive_type().is_fetched()) {
            return Err(TabulaError::ValueTypeMismatch {
                property: virtual_prop.property_name().to_string(),
                expected: "column type".to_string(),
                found: format!("{:?}", virtual_prop.primitive_type()),
            });
        }

        let duplicate = |name: &str| TabulaError::DuplicateField {
            type_name: type_name.to_string(),
            name: name.to_string(),
        };

        let mut by_property = HashMap::new();
        let mut by_field = HashMap::new();
        for descriptor in properties.iter().chain(std::iter::once(&primary_key)) {
            if by_property
                .insert(descriptor.property_name().to_string(), descriptor.clone())
                .is_some()
            {
                return Err(duplicate(descriptor.property_name()));
            }
            if by_field
                .insert(descriptor.storage_field_name().to_string(), descriptor.clone())
                .is_some()
            {
                return Err(duplicate(descriptor.storage_field_name()));
            }
        }
        for fetched_prop in &fetched {
            let descriptor = fetched_prop.descriptor();
            if by_property
                .insert(descriptor.property_name().to_string(), descriptor.clone())
                .is_some()
            {
                return Err(duplicate(descriptor.property_name()));
            }
        }

        Ok(Self {
            type_name: type_name.to_string(),
            table_name: table_name.to_string(),
            properties,
            primary_key,
            fetched,
            by_property,
            by_field,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn primary_key(&self) -> &PropertyDescriptor {
        &self.primary_key
    }

    /// Native properties, optionally followed by the primary key
    pub fn ordered_properties(&self, include_primary_key: bool) -> Vec<&PropertyDescriptor> {
        let mut ordered: Vec<&PropertyDescriptor> = self.properties.iter().collect();
        if include_primary_key {
            ordered.push(&self.primary_key);
        }
        ordered
    }

    /// Storage field names in the same order as [`ordered_properties`](Self::ordered_properties)
    pub fn ordered_fields(&self, include_primary_key: bool) -> Vec<&str> {
        self.ordered_properties(include_primary_key)
            .into_iter()
            .map(PropertyDescriptor::storage_field_name)
            .collect()
    }

    pub fn fetched_properties(&self) -> &[FetchedPropertyDescriptor] {
        &self.fetched
    }

    pub fn fetched_property(&self, property_name: &str) -> Result<&FetchedPropertyDescriptor> {
        self.fetched
            .iter()
            .find(|f| f.property_name() == property_name)
            .ok_or_else(|| self.unknown(property_name))
    }

    pub fn lookup_by_property(&self, property_name: &str) -> Result<&PropertyDescriptor> {
        self.by_property
            .get(property_name)
            .ok_or_else(|| self.unknown(property_name))
    }

    pub fn lookup_by_field(&self, field_name: &str) -> Result<&PropertyDescriptor> {
        self.by_field
            .get(field_name)
            .ok_or_else(|| self.unknown(field_name))
    }

    fn unknown(&self, name: &str) -> TabulaError {
        TabulaError::UnknownProperty {
            type_name: self.type_name.clone(),
            name: name.to_string(),
        }
    }
}

impl NameMapping for TypeEntry {
    fn storage_field(&self, property_name: &str) -> Result<&str> {
        let descriptor = self.lookup_by_property(property_name)?;
        if descriptor.primitive_type().is_fetched() {
            return Err(TabulaError::unsupported(
                "key_path",
                format!(
                    "fetched property '{}' of {} is not a column and cannot be filtered or sorted",
                    property_name, self.type_name
                ),
            ));
        }
        Ok(descriptor.storage_field_name())
    }
}

/// Registry of every storable type known to the process
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    entries: RwLock<HashMap<String, Arc<TypeEntry>>>,
}

static SHARED: OnceLock<Arc<PropertyRegistry>> = OnceLock::new();

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn shared() -> Arc<PropertyRegistry> {
        SHARED.get_or_init(|| Arc::new(PropertyRegistry::new())).clone()
    }

    /// Validate and register a type.
    ///
    /// Registering a name that is already present returns the existing entry
    /// untouched.
    pub fn register(
        &self,
        type_name: &str,
        table_name: &str,
        properties: Vec<PropertyDescriptor>,
        primary_key: PropertyDescriptor,
        fetched: Vec<FetchedPropertyDescriptor>,
    ) -> Result<Arc<TypeEntry>> {
        if let Some(existing) = self.get(type_name) {
            return Ok(existing);
        }
        let entry = Arc::new(TypeEntry::build(
            type_name,
            table_name,
            properties,
            primary_key,
            fetched,
        )?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry(type_name.to_string())
            .or_insert(entry)
            .clone();
        tracing::debug!(type_name, table = entry.table_name(), "registered storage type");
        Ok(entry)
    }

    /// Entry for `T`, registering it on first use
    pub fn entry_for<T: StorageObject>(&self) -> Result<Arc<TypeEntry>> {
        if let Some(existing) = self.get(T::TYPE_NAME) {
            return Ok(existing);
        }
        let properties = T::property_descriptors();
        let accessors = T::accessors();
        for (index, descriptor) in properties.iter().enumerate() {
            let matches = accessors
                .get(index)
                .map(|a| a.property_name() == descriptor.property_name())
                .unwrap_or(false);
            if !matches {
                return Err(TabulaError::UnknownProperty {
                    type_name: T::TYPE_NAME.to_string(),
                    name: format!("accessor for '{}'", descriptor.property_name()),
                });
            }
        }
        if accessors.len() != properties.len() {
            return Err(TabulaError::UnknownProperty {
                type_name: T::TYPE_NAME.to_string(),
                name: accessors[properties.len()].property_name().to_string(),
            });
        }
        self.register(
            T::TYPE_NAME,
            T::table_name(),
            properties,
            T::primary_key_descriptor(),
            T::fetched_property_descriptors(),
        )
    }

    pub fn entry(&self, type_name: &str) -> Result<Arc<TypeEntry>> {
        self.get(type_name)
            .ok_or_else(|| TabulaError::UnregisteredType {
                type_name: type_name.to_string(),
            })
    }

    pub fn lookup_by_property(
        &self,
        type_name: &str,
        property_name: &str,
    ) -> Result<PropertyDescriptor> {
        self.entry(type_name)?
            .lookup_by_property(property_name)
            .cloned()
    }

    pub fn lookup_by_field(&self, type_name: &str, field_name: &str) -> Result<PropertyDescriptor> {
        self.entry(type_name)?.lookup_by_field(field_name).cloned()
    }

    pub fn ordered_fields(&self, type_name: &str, include_primary_key: bool) -> Result<Vec<String>> {
        Ok(self
            .entry(type_name)?
            .ordered_fields(include_primary_key)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    fn get(&self, type_name: &str) -> Option<Arc<TypeEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
            .cloned()
    }
}
