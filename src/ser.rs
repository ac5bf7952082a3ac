//! The record serializer engine.
//!
//! [`RbfSerializer`] walks a [`ComplexTypeMapping`] against an object and writes one
//! record per object. Field values go through the mapping's converter and the
//! [`FieldCodec`]; sub-records and list items each start a new record, introduced by
//! their prefix.
//!
//! ## Usage
//!
//! ```rust
//! use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, ListTypeMapping, TypeMappingRegistry};
//! use rbf_codec::{record, CsvIoFactory, CsvOptions};
//!
//! let mut registry = TypeMappingRegistry::with_standard_types();
//! registry.register(
//!     ComplexTypeMapping::new("order", "Order")
//!         .with_field("id", "int")
//!         .with_list("lines", "lines"),
//! ).unwrap();
//! registry.register(ListTypeMapping::new("lines").with_item("IT", "item", "Item")).unwrap();
//! registry.register(ComplexTypeMapping::new("item", "Item").with_field("sku", "string")).unwrap();
//!
//! let factory = CsvIoFactory::csv(registry, vec![EntryPoint::prefixed("order", "OR")], CsvOptions::new()).unwrap();
//! let mut serializer = factory.serializer(Vec::new());
//! serializer.write(&record!("Order" {
//!     "id": 7,
//!     "lines": [record!("Item" { "sku": "A1" }), record!("Item" { "sku": "B2" })]
//! })).unwrap();
//!
//! let text = String::from_utf8(serializer.into_inner()).unwrap();
//! assert_eq!(text, "OR;7\nIT;A1\nIT;B2\n");
//! ```

use crate::codec::FieldCodec;
use crate::factory::Schema;
use crate::mapping::{ComplexTypeMapping, TypeMapping, TypeMappingRegistry};
use crate::stream::RecordWriter;
use crate::{Error, ObjectRef, Result, Value};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use tracing::trace;

/// Writes objects as records to an output stream.
///
/// Created by [`RbfIoFactory::serializer`](crate::RbfIoFactory::serializer). After an
/// error the output holds a valid but incomplete stream and should be abandoned.
pub struct RbfSerializer<W: Write, C: FieldCodec> {
    out: RecordWriter<W>,
    codec: C,
    schema: Arc<Schema>,
    /// Identities of the objects on the current write path.
    writing: HashSet<usize>,
}

impl<W: Write, C: FieldCodec> RbfSerializer<W, C> {
    pub(crate) fn new(writer: W, codec: C, schema: Arc<Schema>) -> Self {
        RbfSerializer {
            out: RecordWriter::new(writer, codec.rbf_options()),
            codec,
            schema,
            writing: HashSet::new(),
        }
    }

    /// Writes an object, its sub-records and its list items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the value is not an object, no entry point
    /// matches its runtime type, a converter rejects a field value, or the object graph
    /// contains a cycle; [`Error::Io`] if the output fails.
    #[must_use = "this returns the result of the operation, errors must be handled"]
    pub fn write(&mut self, value: &Value) -> Result<()> {
        let object = value.as_object().ok_or_else(|| {
            Error::serialization(format!("only objects can be written, found {}", value.kind()))
        })?;
        let schema = Arc::clone(&self.schema);
        let object_type = object.object_type();
        let entry = schema.entry_for(&object_type).ok_or_else(|| {
            Error::serialization(format!("no entry point for object type {}", object_type))
        })?;
        let mapping = schema.registry.resolve_complex(&entry.data_type_name)?;
        trace!(object_type = %object_type, data_type = %entry.data_type_name, "writing record");

        self.writing.clear();
        if let Some(prefix) = entry.prefix.as_deref().filter(|_| schema.prefixed) {
            self.codec.write_prefix(&mut self.out, prefix)?;
        }
        self.write_complex(&schema.registry, object, mapping)?;
        self.codec.finish_record(&mut self.out)
    }

    fn write_complex(
        &mut self,
        registry: &TypeMappingRegistry,
        object: &ObjectRef,
        mapping: &ComplexTypeMapping,
    ) -> Result<()> {
        self.enter(object)?;
        self.write_fields(registry, Some(object), mapping)?;

        for record in mapping.records() {
            let value = mapping
                .accessor()
                .get_field(object, &record.field_name)
                .map_err(Error::while_writing)?;
            if value.is_null() {
                continue;
            }

            match registry.resolve(&record.data_type_name)? {
                TypeMapping::Complex(child) => {
                    let child_object = expect_object(&value, mapping, &record.field_name)?;
                    let prefix = record.prefix.as_deref().unwrap_or_default();
                    self.codec.finish_record(&mut self.out)?;
                    self.codec.write_prefix(&mut self.out, prefix)?;
                    self.write_complex(registry, child_object, child)?;
                }
                TypeMapping::List(list) => {
                    let items = value.as_list().ok_or_else(|| {
                        Error::serialization(format!(
                            "field {}.{} expects a list, found {}",
                            mapping.data_type_name(),
                            record.field_name,
                            value.kind()
                        ))
                    })?;
                    for item in items {
                        let item_object = expect_object(item, mapping, &record.field_name)?;
                        let item_type = item_object.object_type();
                        let member = registry.list_item_for(list, &item_type).ok_or_else(|| {
                            Error::serialization(format!(
                                "object type {} is not a member of list {}",
                                item_type,
                                list.data_type_name()
                            ))
                        })?;
                        let child = registry.resolve_complex(&member.data_type_name)?;
                        self.codec.finish_record(&mut self.out)?;
                        self.codec.write_prefix(&mut self.out, &member.prefix)?;
                        self.write_complex(registry, item_object, child)?;
                    }
                }
                TypeMapping::Simple(_) => {
                    return Err(Error::configuration(format!(
                        "record {}.{} targets a simple type",
                        mapping.data_type_name(),
                        record.field_name
                    )));
                }
            }
        }

        self.leave(object);
        Ok(())
    }

    /// Writes the fields of `mapping` into the current record; a missing object writes
    /// an empty field per leaf.
    fn write_fields(
        &mut self,
        registry: &TypeMappingRegistry,
        object: Option<&ObjectRef>,
        mapping: &ComplexTypeMapping,
    ) -> Result<()> {
        for field in mapping.fields() {
            let value = match object {
                Some(object) => mapping
                    .accessor()
                    .get_field(object, &field.field_name)
                    .map_err(Error::while_writing)?,
                None => Value::Null,
            };

            match registry.resolve(&field.data_type_name)? {
                TypeMapping::Simple(simple) => {
                    let text = simple.to_text(&value).map_err(|e| {
                        Error::serialization(format!(
                            "field {}.{}: {}",
                            mapping.data_type_name(),
                            field.field_name,
                            e
                        ))
                    })?;
                    self.codec
                        .write_field(&mut self.out, text.as_deref(), &field.layout)?;
                }
                TypeMapping::Complex(child) => match &value {
                    Value::Null => self.write_fields(registry, None, child)?,
                    _ => {
                        let nested = expect_object(&value, mapping, &field.field_name)?;
                        self.enter(nested)?;
                        self.write_fields(registry, Some(nested), child)?;
                        self.leave(nested);
                    }
                },
                TypeMapping::List(_) => {
                    return Err(Error::configuration(format!(
                        "field {}.{} targets a list",
                        mapping.data_type_name(),
                        field.field_name
                    )));
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self, object: &ObjectRef) -> Result<()> {
        if self.writing.insert(object.id()) {
            Ok(())
        } else {
            Err(Error::serialization(format!(
                "object of type {} references itself",
                object.object_type()
            )))
        }
    }

    fn leave(&mut self, object: &ObjectRef) {
        self.writing.remove(&object.id());
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }

    /// Flushes the output. With `flush_and_close_underlying` the writer is dropped,
    /// otherwise it is handed back.
    pub fn close(mut self, flush_and_close_underlying: bool) -> Result<Option<W>> {
        self.out.flush()?;
        if flush_and_close_underlying {
            Ok(None)
        } else {
            Ok(Some(self.out.into_inner()))
        }
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

fn expect_object<'a>(value: &'a Value, owner: &ComplexTypeMapping, field: &str) -> Result<&'a ObjectRef> {
    value.as_object().ok_or_else(|| {
        Error::serialization(format!(
            "field {}.{} expects an object, found {}",
            owner.data_type_name(),
            field,
            value.kind()
        ))
    })
}

#[cfg(test)]
mod tests {
    use crate::mapping::{ComplexTypeMapping, EntryPoint, FieldLayout, ListTypeMapping, TypeMappingRegistry};
    use crate::options::{CsvOptions, FlrOptions};
    use crate::{record, CsvIoFactory, FlrIoFactory, ObjectRef, Value};

    fn order_registry() -> TypeMappingRegistry {
        let mut registry = TypeMappingRegistry::with_standard_types();
        registry
            .register(
                ComplexTypeMapping::new("order", "Order")
                    .with_field("id", "int")
                    .with_field("address", "address")
                    .with_record("customer", "customer", "CU")
                    .with_list("lines", "lines"),
            )
            .unwrap();
        registry
            .register(
                ComplexTypeMapping::new("address", "Address")
                    .with_field("street", "string")
                    .with_field("city", "string"),
            )
            .unwrap();
        registry
            .register(ComplexTypeMapping::new("customer", "Customer").with_field("name", "string"))
            .unwrap();
        registry
            .register(
                ListTypeMapping::new("lines")
                    .with_item("IT", "item", "Item")
                    .with_item("CM", "comment", "Comment"),
            )
            .unwrap();
        registry
            .register(
                ComplexTypeMapping::new("item", "Item")
                    .with_field("sku", "string")
                    .with_field("qty", "int"),
            )
            .unwrap();
        registry
            .register(ComplexTypeMapping::new("comment", "Comment").with_field("text", "string"))
            .unwrap();
        registry
    }

    fn csv() -> CsvIoFactory {
        CsvIoFactory::csv(order_registry(), vec![EntryPoint::prefixed("order", "OR")], CsvOptions::new())
            .unwrap()
    }

    #[test]
    fn test_nested_records() {
        let order = record!("Order" {
            "id": 1,
            "address": record!("Address" { "street": "Main 1", "city": "Bern" }),
            "customer": record!("Customer" { "name": "ACME" }),
            "lines": [
                record!("Item" { "sku": "A1", "qty": 2 }),
                record!("Comment" { "text": "fragile" })
            ]
        });
        assert_eq!(
            csv().to_string(&[order]).unwrap(),
            "OR;1;Main 1;Bern\nCU;ACME\nIT;A1;2\nCM;fragile\n"
        );
    }

    #[test]
    fn test_null_fields_and_records() {
        let order = record!("Order" { "id": 2 });
        assert_eq!(csv().to_string(&[order]).unwrap(), "OR;2;;\n");
    }

    #[test]
    fn test_unregistered_type() {
        let err = csv().to_string(&[record!("Invoice" { "id": 1 })]).unwrap_err();
        assert!(err.is_serialization());
        assert!(err.to_string().contains("Invoice"));
    }

    #[test]
    fn test_non_member_list_item() {
        let order = record!("Order" { "id": 3, "lines": [record!("Customer" { "name": "x" })] });
        assert!(csv().to_string(&[order]).unwrap_err().is_serialization());
    }

    #[test]
    fn test_conversion_failure_is_serialization_error() {
        let order = record!("Order" { "id": "three" });
        let err = csv().to_string(&[order]).unwrap_err();
        assert!(err.is_serialization());
        assert!(err.to_string().contains("order.id"));
    }

    #[test]
    fn test_object_cycle_detected() {
        let mut registry = TypeMappingRegistry::with_standard_types();
        registry.reserve("node").unwrap();
        registry
            .register(ListTypeMapping::new("children").with_item("ND", "node", "Node"))
            .unwrap();
        registry
            .register(
                ComplexTypeMapping::new("node", "Node")
                    .with_field("name", "string")
                    .with_list("children", "children"),
            )
            .unwrap();
        let factory =
            CsvIoFactory::csv(registry, vec![EntryPoint::prefixed("node", "RT")], CsvOptions::new()).unwrap();

        let root = ObjectRef::new("Node").with_field("name", "root");
        root.set("children", Value::List(vec![Value::Object(root.clone())]));
        let err = factory.to_string(&[Value::Object(root.clone())]).unwrap_err();
        assert!(err.to_string().contains("references itself"));
        root.set("children", Value::Null);

        let shared = ObjectRef::new("Node").with_field("name", "leaf");
        let parent = ObjectRef::new("Node").with_field("name", "parent").with_field(
            "children",
            vec![Value::Object(shared.clone()), Value::Object(shared)],
        );
        assert_eq!(
            factory.to_string(&[Value::Object(parent)]).unwrap(),
            "RT;parent\nND;leaf\nND;leaf\n"
        );
    }

    #[test]
    fn test_fixed_length_record() {
        let mut registry = TypeMappingRegistry::with_standard_types();
        registry
            .register(
                ComplexTypeMapping::new("person", "Person")
                    .with_field_layout("name", "string", FieldLayout::fixed(7).with_pad_character('#'))
                    .with_field_layout(
                        "id",
                        "int",
                        FieldLayout::fixed(5).with_align(crate::Align::Right).with_pad_character('0'),
                    ),
            )
            .unwrap();
        let factory = FlrIoFactory::flr(registry, vec![EntryPoint::prefixed("person", "P")], FlrOptions::new())
            .unwrap();
        let people = [
            record!("Person" { "name": "abc", "id": 42 }),
            record!("Person" { "name": "12345678" }),
        ];
        assert_eq!(factory.to_string(&people).unwrap(), "Pabc####00042\nP123456700000\n");
    }
}
