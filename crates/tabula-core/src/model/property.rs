//! Property descriptors
//!
//! Static metadata declared by each storable type. Descriptors are built once
//! at registration and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::model::value::Value;

/// Primitive type of a declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    String,
    Date,
    Blob,
    Boolean,
    Integer,
    Float,
    /// Virtual one-to-one relationship
    Object,
    /// Virtual one-to-many relationship
    ObjectArray,
}

impl PrimitiveType {
    /// SQLite column type, `None` for virtual relationship types
    pub fn column_type(&self) -> Option<&'static str> {
        match self {
            PrimitiveType::String => Some("TEXT"),
            PrimitiveType::Date => Some("REAL"),
            PrimitiveType::Blob => Some("BLOB"),
            PrimitiveType::Boolean => Some("INTEGER"),
            PrimitiveType::Integer => Some("INTEGER"),
            PrimitiveType::Float => Some("REAL"),
            PrimitiveType::Object | PrimitiveType::ObjectArray => None,
        }
    }

    /// True for types resolved through a secondary fetch rather than a column
    pub fn is_fetched(&self) -> bool {
        matches!(self, PrimitiveType::Object | PrimitiveType::ObjectArray)
    }
}

/// One declared property: its name, backing column, and primitive type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    property_name: String,
    storage_field_name: String,
    primitive_type: PrimitiveType,
}

impl PropertyDescriptor {
    pub fn new(
        property_name: impl Into<String>,
        storage_field_name: impl Into<String>,
        primitive_type: PrimitiveType,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            storage_field_name: storage_field_name.into(),
            primitive_type,
        }
    }

    /// Default primary key: property `primary_key` stored in column `id`
    pub fn default_primary_key() -> Self {
        Self::new("primary_key", "id", PrimitiveType::Integer)
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn storage_field_name(&self) -> &str {
        &self.storage_field_name
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive_type
    }
}

/// Cardinality of a fetched property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
}

/// Where a template placeholder takes its value from at resolution time
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSource {
    /// The owner's primary key (`Null` while the owner is unsaved)
    OwnerPrimaryKey,
    /// A native property of the owner, read through its accessor
    OwnerProperty(String),
    /// A fixed value
    Literal(Value),
}

/// A named placeholder of a predicate template and its value source
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateArg {
    pub placeholder: String,
    pub source: ArgSource,
}

impl TemplateArg {
    pub fn new(placeholder: impl Into<String>, source: ArgSource) -> Self {
        Self {
            placeholder: placeholder.into(),
            source,
        }
    }
}

/// Virtual property resolved by fetching instances of another type
///
/// The predicate template refers to owner values through
/// [`Expression::Variable`] nodes, one per entry of `template_args`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPropertyDescriptor {
    descriptor: PropertyDescriptor,
    target_type_name: String,
    cardinality: Cardinality,
    predicate_template: Expression,
    template_args: Vec<TemplateArg>,
}

impl FetchedPropertyDescriptor {
    pub fn one_to_one(
        property_name: impl Into<String>,
        target_type_name: impl Into<String>,
        predicate_template: Expression,
        template_args: Vec<TemplateArg>,
    ) -> Self {
        Self::build(
            property_name.into(),
            target_type_name.into(),
            Cardinality::OneToOne,
            predicate_template,
            template_args,
        )
    }

    pub fn one_to_many(
        property_name: impl Into<String>,
        target_type_name: impl Into<String>,
        predicate_template: Expression,
        template_args: Vec<TemplateArg>,
    ) -> Self {
        Self::build(
            property_name.into(),
            target_type_name.into(),
            Cardinality::OneToMany,
            predicate_template,
            template_args,
        )
    }

    fn build(
        property_name: String,
        target_type_name: String,
        cardinality: Cardinality,
        predicate_template: Expression,
        template_args: Vec<TemplateArg>,
    ) -> Self {
        let primitive_type = match cardinality {
            Cardinality::OneToOne => PrimitiveType::Object,
            Cardinality::OneToMany => PrimitiveType::ObjectArray,
        };
        // Virtual: the "field" name only participates in uniqueness checks.
        let descriptor = PropertyDescriptor::new(&property_name, &property_name, primitive_type);
        Self {
            descriptor,
            target_type_name,
            cardinality,
            predicate_template,
            template_args,
        }
    }

    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    pub fn property_name(&self) -> &str {
        self.descriptor.property_name()
    }

    pub fn target_type_name(&self) -> &str {
        &self.target_type_name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn predicate_template(&self) -> &Expression {
        &self.predicate_template
    }

    pub fn template_args(&self) -> &[TemplateArg] {
        &self.template_args
    }
}
