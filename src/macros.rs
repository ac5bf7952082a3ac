/// Builds a [`Value::Object`](crate::Value::Object) from a runtime type name and field literals.
///
/// Field values may be `null`, a bracketed list of expressions, or any expression
/// convertible into a [`Value`](crate::Value) (nested `record!` calls included).
///
/// ```rust
/// use rbf_codec::{record, Value};
///
/// let order = record!("Order" {
///     "id": 42,
///     "customer": "ACME",
///     "note": null,
///     "lines": [
///         record!("Item" { "sku": "A1", "qty": 2 }),
///         record!("Comment" { "text": "fragile" })
///     ]
/// });
///
/// let order = order.as_object().unwrap();
/// assert_eq!(order.object_type(), "Order");
/// assert_eq!(order.get("id"), Value::from(42));
/// assert_eq!(order.get("lines").as_list().map(Vec::len), Some(2));
/// ```
#[macro_export]
macro_rules! record {
    (@fields $object:ident) => {};

    (@fields $object:ident $field:literal : null $(, $($rest:tt)*)?) => {
        $object.set($field, $crate::Value::Null);
        $crate::record!(@fields $object $($($rest)*)?);
    };

    (@fields $object:ident $field:literal : [ $($elem:expr),* $(,)? ] $(, $($rest:tt)*)?) => {
        $object.set($field, $crate::Value::List(vec![$($crate::Value::from($elem)),*]));
        $crate::record!(@fields $object $($($rest)*)?);
    };

    (@fields $object:ident $field:literal : $value:expr $(, $($rest:tt)*)?) => {
        $object.set($field, $crate::Value::from($value));
        $crate::record!(@fields $object $($($rest)*)?);
    };

    ($object_type:literal { $($body:tt)* }) => {{
        let object = $crate::ObjectRef::new($object_type);
        $crate::record!(@fields object $($body)*);
        $crate::Value::Object(object)
    }};
}

#[cfg(test)]
mod tests {
    use crate::{Number, ObjectRef, Value};

    #[test]
    fn test_record_macro_fields() {
        let value = record!("Person" {
            "name": "Alice",
            "age": 30,
            "nickname": null
        });

        let person = value.as_object().unwrap();
        assert_eq!(person.object_type(), "Person");
        assert_eq!(person.get("name"), Value::String("Alice".to_string()));
        assert_eq!(person.get("age"), Value::Number(Number::Integer(30)));
        assert!(person.get("nickname").is_null());
    }

    #[test]
    fn test_record_macro_empty() {
        assert_eq!(record!("Empty" {}), Value::Object(ObjectRef::new("Empty")));
    }

    #[test]
    fn test_record_macro_nested_list() {
        let value = record!("Order" {
            "lines": [record!("Item" { "sku": "A1" }), record!("Item" { "sku": "B2" })]
        });
        let lines = value.as_object().unwrap().get("lines");
        let lines = lines.as_list().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1].as_object().unwrap().get("sku"),
            Value::from("B2")
        );
    }
}
