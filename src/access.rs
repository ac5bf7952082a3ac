//! Object instantiation and field access.
//!
//! Every [`ComplexTypeMapping`](crate::mapping::ComplexTypeMapping) carries an
//! [`ObjectAccessor`]. The engines only create objects and move field values through it,
//! so an accessor can rename fields, fill defaults or validate values without the engines
//! knowing. [`DynamicAccessor`] is the plain implementation over [`ObjectRef`] fields.

use crate::{ObjectRef, Result, Value};
use std::fmt;

pub trait ObjectAccessor: Send + Sync + fmt::Debug {
    /// Creates an empty object of the given runtime type.
    fn create_instance(&self, object_type: &str) -> Result<ObjectRef>;

    /// Returns a field's value; unset fields are [`Value::Null`].
    fn get_field(&self, object: &ObjectRef, field: &str) -> Result<Value>;

    fn set_field(&self, object: &ObjectRef, field: &str, value: Value) -> Result<()>;
}

/// Reads and writes fields of [`ObjectRef`]s by name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicAccessor;

impl ObjectAccessor for DynamicAccessor {
    fn create_instance(&self, object_type: &str) -> Result<ObjectRef> {
        Ok(ObjectRef::new(object_type))
    }

    fn get_field(&self, object: &ObjectRef, field: &str) -> Result<Value> {
        Ok(object.get(field))
    }

    fn set_field(&self, object: &ObjectRef, field: &str, value: Value) -> Result<()> {
        object.set(field, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_accessor() {
        let accessor = DynamicAccessor;
        let object = accessor.create_instance("Person").unwrap();
        accessor
            .set_field(&object, "name", Value::from("Alice"))
            .unwrap();

        assert_eq!(object.object_type(), "Person");
        assert_eq!(
            accessor.get_field(&object, "name").unwrap(),
            Value::from("Alice")
        );
        assert!(accessor.get_field(&object, "age").unwrap().is_null());
    }
}
