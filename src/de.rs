//! The record deserializer engine.
//!
//! [`RbfDeserializer`] is the mirror image of [`RbfSerializer`](crate::RbfSerializer):
//! it reads a top-level record, dispatches on its prefix to an entry point, reads the
//! record's fields, then looks ahead one record at a time for sub-records and list
//! items. A record whose prefix does not fit the current position is pushed back for
//! the caller above.
//!
//! ## Fault tolerance
//!
//! A record that fails to decode raises [`Error::Deserialization`] with its line
//! number. The reader has already moved past it, so the following `next()` call
//! continues with the next top-level record:
//!
//! ```rust
//! use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, TypeMappingRegistry};
//! use rbf_codec::{CsvIoFactory, CsvOptions, Value};
//!
//! let mut registry = TypeMappingRegistry::with_standard_types();
//! registry.register(ComplexTypeMapping::new("reading", "Reading").with_field("value", "int")).unwrap();
//! let factory = CsvIoFactory::csv(registry, vec![EntryPoint::new("reading")], CsvOptions::new()).unwrap();
//!
//! let mut de = factory.deserializer("1\nx\n3\n".as_bytes());
//! assert_eq!(de.next().unwrap().unwrap().as_object().unwrap().get("value"), Value::from(1));
//! assert_eq!(de.next().unwrap_err().line(), Some(2));
//! assert_eq!(de.next().unwrap().unwrap().as_object().unwrap().get("value"), Value::from(3));
//! assert!(!de.has_next().unwrap());
//! ```

use crate::codec::FieldCodec;
use crate::factory::Schema;
use crate::mapping::{ComplexTypeMapping, TypeMapping, TypeMappingRegistry};
use crate::stream::{InputPosition, RecordReader};
use crate::{Error, ObjectRef, Result, Value};
use std::io::BufRead;
use std::sync::Arc;
use tracing::{debug, trace};

/// Reads objects from a stream of records.
///
/// Created by [`RbfIoFactory::deserializer`](crate::RbfIoFactory::deserializer).
pub struct RbfDeserializer<R: BufRead, C: FieldCodec> {
    input: RecordReader<R>,
    codec: C,
    schema: Arc<Schema>,
    /// Entry point matched by `has_next` whose record has not been read yet.
    pending: Option<usize>,
}

impl<R: BufRead, C: FieldCodec> RbfDeserializer<R, C> {
    pub(crate) fn new(reader: R, codec: C, schema: Arc<Schema>) -> Self {
        RbfDeserializer {
            input: RecordReader::new(reader, codec.rbf_options()),
            codec,
            schema,
            pending: None,
        }
    }

    /// Returns true if another top-level record is available.
    ///
    /// Records whose prefix names no entry point are skipped. Calling this repeatedly
    /// without `next` does not consume anything.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        loop {
            if !self.input.read_next_record()? {
                return Ok(false);
            }
            if !self.schema.prefixed {
                self.pending = Some(0);
                return Ok(true);
            }

            let prefix = self
                .codec
                .read_prefix(&mut self.input, self.schema.prefix_length)
                .map_err(|e| self.positioned(e))?;
            match prefix.as_deref().and_then(|p| self.schema.entry_index_for_prefix(p)) {
                Some(index) => {
                    self.pending = Some(index);
                    return Ok(true);
                }
                None => {
                    trace!(
                        line_number = self.input.line_number(),
                        prefix = prefix.as_deref().unwrap_or_default(),
                        "skipping record with unknown prefix"
                    );
                    self.codec.skip_record(&mut self.input);
                }
            }
        }
    }

    /// Reads the next top-level object.
    ///
    /// Returns `Ok(None)` if the record produced no content at all (every field empty
    /// and no sub-records).
    ///
    /// # Errors
    ///
    /// [`Error::NoMoreRecords`] at the end of the stream; [`Error::Deserialization`] if
    /// the record cannot be decoded.
    #[allow(clippy::should_implement_trait)]
    #[must_use = "this returns the result of the operation, errors must be handled"]
    pub fn next(&mut self) -> Result<Option<Value>> {
        if !self.has_next()? {
            return Err(Error::NoMoreRecords);
        }
        let index = self.pending.take().ok_or(Error::NoMoreRecords)?;
        let schema = Arc::clone(&self.schema);
        let entry = &schema.entry_points[index];

        let result = schema
            .registry
            .resolve_complex(&entry.data_type_name)
            .and_then(|mapping| self.read_complex(&schema.registry, mapping));
        match result {
            Ok(object) => Ok(object.map(Value::Object)),
            Err(err) => Err(self.positioned(err)),
        }
    }

    fn positioned(&self, err: Error) -> Error {
        let position = self.input.position();
        let err = err.at_position(position.line_number, position.column_number);
        debug!(line_number = position.line_number, error = %err, "record could not be decoded");
        err
    }

    /// Reads the current record's fields and the records that belong to it.
    fn read_complex(
        &mut self,
        registry: &TypeMappingRegistry,
        mapping: &ComplexTypeMapping,
    ) -> Result<Option<ObjectRef>> {
        let accessor = mapping.accessor();
        let object = accessor.create_instance(mapping.object_type())?;
        let mut has_content = self.read_fields(registry, &object, mapping)?;
        self.codec.skip_record(&mut self.input);
        let prefix_length = child_prefix_length(registry, mapping)?;

        for record in mapping.records() {
            match registry.resolve(&record.data_type_name)? {
                TypeMapping::Complex(child) => {
                    let expected = record.prefix.as_deref().unwrap_or_default();
                    if self.next_child(prefix_length, |p| p == expected)?.is_some() {
                        if let Some(child_object) = self.read_complex(registry, child)? {
                            accessor.set_field(&object, &record.field_name, Value::Object(child_object))?;
                            has_content = true;
                        }
                    }
                }
                TypeMapping::List(list) => {
                    let mut items = Vec::new();
                    while let Some(prefix) =
                        self.next_child(prefix_length, |p| list.item_for_prefix(p).is_some())?
                    {
                        let member = list.item_for_prefix(&prefix).ok_or_else(|| {
                            Error::custom(format!("unknown list prefix {}", prefix))
                        })?;
                        let child = registry.resolve_complex(&member.data_type_name)?;
                        if let Some(item) = self.read_complex(registry, child)? {
                            items.push(Value::Object(item));
                        }
                    }
                    has_content |= !items.is_empty();
                    accessor.set_field(&object, &record.field_name, Value::List(items))?;
                }
                TypeMapping::Simple(_) => {}
            }
        }

        Ok(if has_content { Some(object) } else { None })
    }

    /// Reads fields into `object`; returns true if any field had a value.
    fn read_fields(
        &mut self,
        registry: &TypeMappingRegistry,
        object: &ObjectRef,
        mapping: &ComplexTypeMapping,
    ) -> Result<bool> {
        let accessor = mapping.accessor();
        let mut has_content = false;

        for field in mapping.fields() {
            match registry.resolve(&field.data_type_name)? {
                TypeMapping::Simple(simple) => {
                    let text = self.codec.read_field(&mut self.input, &field.layout)?;
                    let value = simple.from_text(text.as_deref()).map_err(|e| {
                        Error::conversion(format!(
                            "field {}.{}: {}",
                            mapping.data_type_name(),
                            field.field_name,
                            e
                        ))
                    })?;
                    if !value.is_null() {
                        accessor.set_field(object, &field.field_name, value)?;
                        has_content = true;
                    }
                }
                TypeMapping::Complex(child) => {
                    let nested = child.accessor().create_instance(child.object_type())?;
                    if self.read_fields(registry, &nested, child)? {
                        accessor.set_field(object, &field.field_name, Value::Object(nested))?;
                        has_content = true;
                    }
                }
                TypeMapping::List(_) => {
                    return Err(Error::configuration(format!(
                        "field {}.{} targets a list",
                        mapping.data_type_name(),
                        field.field_name
                    )));
                }
            }
        }
        Ok(has_content)
    }

    /// Advances to the next record if its prefix is accepted, otherwise pushes it back.
    fn next_child(&mut self, prefix_length: usize, accept: impl Fn(&str) -> bool) -> Result<Option<String>> {
        if !self.input.read_next_record()? {
            return Ok(None);
        }
        match self.codec.read_prefix(&mut self.input, prefix_length)? {
            Some(prefix) if accept(&prefix) => Ok(Some(prefix)),
            _ => {
                self.input.unread_record();
                Ok(None)
            }
        }
    }

    /// Position of the most recent read, for diagnostics.
    #[must_use]
    pub fn input_position(&self) -> InputPosition {
        self.input.position()
    }

    /// Lines dropped by the configured line filter so far.
    #[must_use]
    pub fn filtered_lines(&self) -> &[String] {
        self.input.filtered_lines()
    }

    /// Ends deserialization. With `close_underlying` the reader is dropped, otherwise
    /// it is handed back.
    pub fn close(self, close_underlying: bool) -> Option<R> {
        if close_underlying {
            None
        } else {
            Some(self.input.into_inner())
        }
    }

    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }
}

/// Prefix length shared by the records below `mapping`.
fn child_prefix_length(registry: &TypeMappingRegistry, mapping: &ComplexTypeMapping) -> Result<usize> {
    let first = match mapping.records().first() {
        Some(record) => record,
        None => return Ok(0),
    };
    let prefix = match registry.resolve(&first.data_type_name)? {
        TypeMapping::List(list) => list.items().first().map(|item| item.prefix.as_str()),
        _ => first.prefix.as_deref(),
    };
    Ok(prefix.map_or(0, |p| p.chars().count()))
}

#[cfg(test)]
mod tests {
    use crate::mapping::{ComplexTypeMapping, EntryPoint, FieldLayout, ListTypeMapping, TypeMappingRegistry};
    use crate::options::{CsvOptions, FlrOptions, RbfOptions};
    use crate::{record, CsvIoFactory, Error, FlrIoFactory, Value};

    fn shelf_registry() -> TypeMappingRegistry {
        let mut registry = TypeMappingRegistry::with_standard_types();
        registry
            .register(
                ComplexTypeMapping::new("shelf", "Shelf")
                    .with_field("name", "string")
                    .with_list("items", "items"),
            )
            .unwrap();
        registry
            .register(
                ListTypeMapping::new("items")
                    .with_item("BK", "book", "Book")
                    .with_item("MG", "magazine", "Magazine"),
            )
            .unwrap();
        registry
            .register(
                ComplexTypeMapping::new("book", "Book")
                    .with_field("title", "string")
                    .with_field("pages", "int"),
            )
            .unwrap();
        registry
            .register(
                ComplexTypeMapping::new("magazine", "Magazine")
                    .with_field("title", "string")
                    .with_field("issue", "int"),
            )
            .unwrap();
        registry
    }

    fn shelves(options: CsvOptions) -> CsvIoFactory {
        CsvIoFactory::csv(shelf_registry(), vec![EntryPoint::prefixed("shelf", "SH")], options).unwrap()
    }

    #[test]
    fn test_polymorphic_list() {
        let factory = shelves(CsvOptions::new());
        let shelf = record!("Shelf" {
            "name": "top",
            "items": [
                record!("Book" { "title": "Dune", "pages": 412 }),
                record!("Magazine" { "title": "Wired", "issue": 7 })
            ]
        });
        let empty = record!("Shelf" { "name": "bottom", "items": [] });

        let text = factory.to_string(&[shelf.clone(), empty.clone()]).unwrap();
        assert_eq!(text, "SH;top\nBK;Dune;412\nMG;Wired;7\nSH;bottom\n");
        assert_eq!(factory.from_str(&text).unwrap(), vec![shelf, empty]);
    }

    #[test]
    fn test_self_referencing_list() {
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

        let chain = record!("Node" {
            "name": "root",
            "children": [record!("Node" {
                "name": "child",
                "children": [record!("Node" { "name": "leaf", "children": [] })]
            })]
        });
        let text = factory.to_string(&[chain.clone()]).unwrap();
        assert_eq!(text, "RT;root\nND;child\nND;leaf\n");
        assert_eq!(factory.from_str(&text).unwrap(), vec![chain]);

        // Siblings below a recursive list are indistinguishable from a chain.
        let siblings = record!("Node" {
            "name": "root",
            "children": [
                record!("Node" { "name": "a", "children": [] }),
                record!("Node" { "name": "b", "children": [] })
            ]
        });
        let text = factory.to_string(&[siblings.clone()]).unwrap();
        assert_eq!(text, "RT;root\nND;a\nND;b\n");

        let nested = record!("Node" {
            "name": "root",
            "children": [record!("Node" {
                "name": "a",
                "children": [record!("Node" { "name": "b", "children": [] })]
            })]
        });
        let read = factory.from_str(&text).unwrap();
        assert_eq!(read, vec![nested]);
        assert_ne!(read, vec![siblings]);
    }

    #[test]
    fn test_unknown_prefix_skipped() {
        let factory = shelves(CsvOptions::new());
        let mut de = factory.deserializer("XX;junk\nSH;a\n".as_bytes());
        assert!(de.has_next().unwrap());
        assert!(de.has_next().unwrap());
        let shelf = de.next().unwrap().unwrap();
        assert_eq!(shelf.as_object().unwrap().get("name"), Value::from("a"));
        assert!(matches!(de.next(), Err(Error::NoMoreRecords)));
    }

    #[test]
    fn test_empty_record_yields_none() {
        let mut registry = TypeMappingRegistry::with_standard_types();
        registry
            .register(
                ComplexTypeMapping::new("pair", "Pair")
                    .with_field("a", "string")
                    .with_field("b", "string"),
            )
            .unwrap();
        let factory = CsvIoFactory::csv(registry, vec![EntryPoint::prefixed("pair", "PR")], CsvOptions::new())
            .unwrap();
        let mut de = factory.deserializer("PR;;\nPR;x\n".as_bytes());
        assert_eq!(de.next().unwrap(), None);
        assert!(de.next().unwrap().is_some());
    }

    #[test]
    fn test_special_record_delimiter_roundtrip() {
        let options = CsvOptions::new().with_rbf(RbfOptions::new().with_special_record_delimiter('|'));
        let factory = shelves(options);
        let shelf = record!("Shelf" {
            "name": "a|b",
            "items": [record!("Book" { "title": "x", "pages": 1 })]
        });
        let text = factory.to_string(&[shelf.clone()]).unwrap();
        assert_eq!(text, "SH;\"a|b\"|BK;x;1|");
        assert_eq!(factory.from_str(&text).unwrap(), vec![shelf]);
    }

    #[test]
    fn test_quoted_delimiter_in_ignored_fields() {
        let options = CsvOptions::new().with_rbf(RbfOptions::new().with_special_record_delimiter('|'));
        let factory = shelves(options);
        let text = "SH;a;\"extra|field\"|XX;\"p|q\"|SH;b|";
        assert_eq!(
            factory.from_str(text).unwrap(),
            vec![
                record!("Shelf" { "name": "a", "items": [] }),
                record!("Shelf" { "name": "b", "items": [] })
            ]
        );
    }

    #[test]
    fn test_input_position_and_filtered_lines() {
        let options = CsvOptions::new().with_rbf(
            RbfOptions::new().with_line_filter(|line: &str, _: usize| line.starts_with('#')),
        );
        let factory = shelves(options);
        let mut de = factory.deserializer("# export\nSH;a\n".as_bytes());
        assert!(de.next().unwrap().is_some());
        assert_eq!(de.input_position().line_number, 2);
        assert_eq!(de.filtered_lines(), &["# export".to_string()]);
    }

    #[test]
    fn test_fixed_length_prefix_dispatch() {
        let mut registry = TypeMappingRegistry::with_standard_types();
        registry
            .register(
                ComplexTypeMapping::new("header", "Header")
                    .with_field_layout("batch", "int", FieldLayout::fixed(4)),
            )
            .unwrap();
        registry
            .register(
                ComplexTypeMapping::new("payment", "Payment")
                    .with_field_layout("payee", "string", FieldLayout::fixed(6))
                    .with_field_layout("amount", "int", FieldLayout::fixed(5)),
            )
            .unwrap();
        let factory = FlrIoFactory::flr(
            registry,
            vec![EntryPoint::prefixed("header", "HD"), EntryPoint::prefixed("payment", "PM")],
            FlrOptions::new(),
        )
        .unwrap();

        let values = factory.from_str("HD7   \nPMAlice 120  \nZZignored\nPMBob   7\n").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].as_object().unwrap().object_type(), "Header");
        assert_eq!(values[2].as_object().unwrap().get("payee"), Value::from("Bob"));
        assert_eq!(values[2].as_object().unwrap().get("amount"), Value::from(7));
    }
}
