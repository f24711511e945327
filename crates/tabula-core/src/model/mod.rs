pub mod object;
pub mod property;
pub mod value;

pub use object::{AnyStorageObject, PrimaryKey, PropertyAccessor, StorageObject, StorageRecord};
pub use property::{
    ArgSource, Cardinality, FetchedPropertyDescriptor, PrimitiveType, PropertyDescriptor,
    TemplateArg,
};
pub use value::{FromValue, Value};
