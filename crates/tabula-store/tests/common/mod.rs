// Shared fixtures for tabula-store integration tests
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use tabula_core::{
    ArgSource, Expression, FetchedPropertyDescriptor, FromValue, Operator, PrimaryKey,
    PrimitiveType, PropertyAccessor, PropertyDescriptor, StorageObject, TemplateArg,
};
use tabula_store::{Fetched, StorageLayer};

/// Object with one field of each scalar kind plus two fetched properties
#[derive(Debug, Default, Clone)]
pub struct ComplexObject {
    pub key: PrimaryKey,
    pub title: String,
    pub foreign_key: Option<i64>,
    pub some_date: Option<DateTime<Utc>>,
    pub data_blob: Vec<u8>,
    /// NumericObject whose `my_integer` equals `foreign_key`
    pub fetched_object: Fetched<NumericObject>,
    /// NumericObjects whose `integer_object` equals this object's key
    pub fetched_list: Fetched<NumericObject>,
}

impl StorageObject for ComplexObject {
    const TYPE_NAME: &'static str = "ComplexObject";

    fn table_name() -> &'static str {
        "complex_objects"
    }

    fn property_descriptors() -> Vec<PropertyDescriptor> {
        vec![
            PropertyDescriptor::new("title", "title", PrimitiveType::String),
            PropertyDescriptor::new("foreign_key", "foreign_key", PrimitiveType::Integer),
            PropertyDescriptor::new("some_date", "some_date_ts", PrimitiveType::Date),
            PropertyDescriptor::new("data_blob", "data_blob", PrimitiveType::Blob),
        ]
    }

    fn fetched_property_descriptors() -> Vec<FetchedPropertyDescriptor> {
        vec![
            FetchedPropertyDescriptor::one_to_one(
                "fetched_object",
                NumericObject::TYPE_NAME,
                Expression::compare("my_integer", Operator::Equal, Expression::var("FK")),
                vec![TemplateArg::new(
                    "FK",
                    ArgSource::OwnerProperty("foreign_key".to_string()),
                )],
            ),
            FetchedPropertyDescriptor::one_to_many(
                "fetched_list",
                NumericObject::TYPE_NAME,
                Expression::compare("integer_object", Operator::Equal, Expression::var("PK")),
                vec![TemplateArg::new("PK", ArgSource::OwnerPrimaryKey)],
            ),
        ]
    }

    fn accessors() -> Vec<PropertyAccessor<Self>> {
        vec![
            PropertyAccessor::<Self>::new(
                "title",
                |o| o.title.clone().into(),
                |o, v| {
                    o.title = FromValue::from_value("title", v)?;
                    Ok(())
                },
            ),
            PropertyAccessor::<Self>::new(
                "foreign_key",
                |o| o.foreign_key.into(),
                |o, v| {
                    o.foreign_key = FromValue::from_value("foreign_key", v)?;
                    Ok(())
                },
            ),
            PropertyAccessor::<Self>::new(
                "some_date",
                |o| o.some_date.into(),
                |o, v| {
                    o.some_date = FromValue::from_value("some_date", v)?;
                    Ok(())
                },
            ),
            PropertyAccessor::<Self>::new(
                "data_blob",
                |o| o.data_blob.clone().into(),
                |o, v| {
                    o.data_blob = FromValue::from_value("data_blob", v)?;
                    Ok(())
                },
            ),
        ]
    }

    fn primary_key(&self) -> &PrimaryKey {
        &self.key
    }

    fn primary_key_mut(&mut self) -> &mut PrimaryKey {
        &mut self.key
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NumericObject {
    pub key: PrimaryKey,
    pub is_true: bool,
    pub my_integer: i64,
    pub my_float: f64,
    pub integer_object: Option<i64>,
    pub loads: u32,
}

impl StorageObject for NumericObject {
    const TYPE_NAME: &'static str = "NumericObject";

    fn table_name() -> &'static str {
        "numeric_objects"
    }

    fn property_descriptors() -> Vec<PropertyDescriptor> {
        vec![
            PropertyDescriptor::new("is_true", "is_true", PrimitiveType::Boolean),
            PropertyDescriptor::new("my_integer", "my_integer", PrimitiveType::Integer),
            PropertyDescriptor::new("my_float", "my_float", PrimitiveType::Float),
            PropertyDescriptor::new("integer_object", "integer_object", PrimitiveType::Integer),
        ]
    }

    fn accessors() -> Vec<PropertyAccessor<Self>> {
        vec![
            PropertyAccessor::<Self>::new(
                "is_true",
                |o| o.is_true.into(),
                |o, v| {
                    o.is_true = FromValue::from_value("is_true", v)?;
                    Ok(())
                },
            ),
            PropertyAccessor::<Self>::new(
                "my_integer",
                |o| o.my_integer.into(),
                |o, v| {
                    o.my_integer = FromValue::from_value("my_integer", v)?;
                    Ok(())
                },
            ),
            PropertyAccessor::<Self>::new(
                "my_float",
                |o| o.my_float.into(),
                |o, v| {
                    o.my_float = FromValue::from_value("my_float", v)?;
                    Ok(())
                },
            ),
            PropertyAccessor::<Self>::new(
                "integer_object",
                |o| o.integer_object.into(),
                |o, v| {
                    o.integer_object = FromValue::from_value("integer_object", v)?;
                    Ok(())
                },
            ),
        ]
    }

    fn primary_key(&self) -> &PrimaryKey {
        &self.key
    }

    fn primary_key_mut(&mut self) -> &mut PrimaryKey {
        &mut self.key
    }

    fn did_load_values(&mut self) {
        self.loads += 1;
    }
}

/// Registered but never given a table; saving one aborts the batch
#[derive(Debug, Default, Clone)]
pub struct OrphanObject {
    pub key: PrimaryKey,
    pub label: String,
}

impl StorageObject for OrphanObject {
    const TYPE_NAME: &'static str = "OrphanObject";

    fn table_name() -> &'static str {
        "orphan_objects"
    }

    fn property_descriptors() -> Vec<PropertyDescriptor> {
        vec![PropertyDescriptor::new("label", "label", PrimitiveType::String)]
    }

    fn accessors() -> Vec<PropertyAccessor<Self>> {
        vec![PropertyAccessor::<Self>::new(
            "label",
            |o| o.label.clone().into(),
            |o, v| {
                o.label = FromValue::from_value("label", v)?;
                Ok(())
            },
        )]
    }

    fn primary_key(&self) -> &PrimaryKey {
        &self.key
    }

    fn primary_key_mut(&mut self) -> &mut PrimaryKey {
        &mut self.key
    }
}

/// In-memory layer with both fixture tables created
pub fn setup_layer() -> StorageLayer {
    let layer = StorageLayer::open_in_memory().unwrap();
    layer.create_table::<ComplexObject>().unwrap();
    layer.create_table::<NumericObject>().unwrap();
    layer
}

pub fn numeric(is_true: bool, my_integer: i64, my_float: f64, integer_object: Option<i64>) -> NumericObject {
    NumericObject {
        is_true,
        my_integer,
        my_float,
        integer_object,
        ..Default::default()
    }
}

pub fn complex(title: &str, foreign_key: Option<i64>) -> ComplexObject {
    ComplexObject {
        title: title.to_string(),
        foreign_key,
        some_date: Some(Utc.with_ymd_and_hms(2023, 11, 4, 8, 15, 0).unwrap()),
        data_blob: title.as_bytes().to_vec(),
        ..Default::default()
    }
}

/// Twelve numeric rows covering both booleans, negatives, and null links
pub fn numeric_dataset() -> Vec<NumericObject> {
    (0..12)
        .map(|i| {
            numeric(
                i % 3 == 0,
                i - 4,
                f64::from(i as i32) * 1.5,
                if i % 4 == 0 { None } else { Some(i % 4) },
            )
        })
        .collect()
}
