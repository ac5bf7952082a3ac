//! I/O factories: validate a schema once, then open any number of serializers
//! and deserializers over it.
//!
//! ```rust
//! use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, TypeMappingRegistry};
//! use rbf_codec::{record, CsvIoFactory, CsvOptions};
//!
//! let mut registry = TypeMappingRegistry::with_standard_types();
//! registry.register(
//!     ComplexTypeMapping::new("person", "Person")
//!         .with_field("name", "string")
//!         .with_field("age", "int"),
//! ).unwrap();
//!
//! let factory = CsvIoFactory::csv(registry, vec![EntryPoint::new("person")], CsvOptions::new()).unwrap();
//! let people = vec![
//!     record!("Person" { "name": "Alice", "age": 30 }),
//!     record!("Person" { "name": "Bob; Jr.", "age": 7 }),
//! ];
//!
//! let text = factory.to_string(&people).unwrap();
//! assert_eq!(text, "Alice;30\n\"Bob; Jr.\";7\n");
//! assert_eq!(factory.from_str(&text).unwrap(), people);
//! ```

use crate::codec::{CsvCodec, FieldCodec, FlrCodec};
use crate::de::RbfDeserializer;
use crate::mapping::validate::validate_schema;
use crate::mapping::{EntryPoint, TypeMapping, TypeMappingRegistry};
use crate::options::{CsvOptions, FlrOptions};
use crate::ser::RbfSerializer;
use crate::{Error, Result, Value};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

/// A validated schema, shared read-only by every serializer and deserializer of a factory.
#[derive(Debug)]
pub(crate) struct Schema {
    pub(crate) registry: Arc<TypeMappingRegistry>,
    pub(crate) entry_points: Vec<EntryPoint>,
    pub(crate) prefixed: bool,
    /// Length of the entry point prefixes; zero when the stream is not prefixed.
    pub(crate) prefix_length: usize,
    by_object_type: HashMap<String, usize>,
    by_prefix: HashMap<String, usize>,
}

impl Schema {
    /// Resolves a runtime type to an entry point, falling back to the nearest supertype.
    pub(crate) fn entry_for(&self, object_type: &str) -> Option<&EntryPoint> {
        self.registry
            .type_chain(object_type)
            .find_map(|candidate| self.by_object_type.get(candidate))
            .map(|&index| &self.entry_points[index])
    }

    pub(crate) fn entry_index_for_prefix(&self, prefix: &str) -> Option<usize> {
        self.by_prefix.get(prefix).copied()
    }
}

/// Creates serializers and deserializers for one schema and one field codec.
#[derive(Debug, Clone)]
pub struct RbfIoFactory<C> {
    codec: C,
    schema: Arc<Schema>,
}

pub type CsvIoFactory = RbfIoFactory<CsvCodec>;
pub type FlrIoFactory = RbfIoFactory<FlrCodec>;
pub type CsvSerializer<W> = RbfSerializer<W, CsvCodec>;
pub type CsvDeserializer<R> = RbfDeserializer<R, CsvCodec>;
pub type FlrSerializer<W> = RbfSerializer<W, FlrCodec>;
pub type FlrDeserializer<R> = RbfDeserializer<R, FlrCodec>;

impl<C: FieldCodec + Clone> RbfIoFactory<C> {
    /// Validates the schema for the given entry points and codec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unresolved names, field cycles, prefix
    /// collisions or inconsistent prefix lengths, and for field layouts the codec
    /// cannot encode.
    pub fn new(
        registry: impl Into<Arc<TypeMappingRegistry>>,
        entry_points: Vec<EntryPoint>,
        codec: C,
    ) -> Result<Self> {
        let registry = registry.into();
        let reachable = validate_schema(&registry, &entry_points)?;
        for mapping in &reachable {
            for field in mapping.fields() {
                if let Some(TypeMapping::Simple(_)) = registry.get(&field.data_type_name) {
                    codec.validate_layout(mapping.data_type_name(), field)?;
                }
            }
        }

        let prefixed = entry_points.iter().any(|e| e.prefix.is_some());
        let prefix_length = entry_points
            .iter()
            .find_map(|e| e.prefix.as_deref())
            .map_or(0, |p| p.chars().count());

        let mut by_object_type = HashMap::new();
        let mut by_prefix = HashMap::new();
        for (index, entry) in entry_points.iter().enumerate() {
            let mapping = registry.resolve_complex(&entry.data_type_name)?;
            by_object_type
                .entry(mapping.object_type().to_string())
                .or_insert(index);
            if let Some(prefix) = &entry.prefix {
                by_prefix.insert(prefix.clone(), index);
            }
        }

        debug!(
            format = codec.name(),
            entry_points = entry_points.len(),
            complex_types = reachable.len(),
            prefixed,
            "schema validated"
        );

        Ok(RbfIoFactory {
            codec,
            schema: Arc::new(Schema {
                registry,
                entry_points,
                prefixed,
                prefix_length,
                by_object_type,
                by_prefix,
            }),
        })
    }

    pub fn serializer<W: Write>(&self, writer: W) -> RbfSerializer<W, C> {
        RbfSerializer::new(writer, self.codec.clone(), Arc::clone(&self.schema))
    }

    pub fn deserializer<R: BufRead>(&self, reader: R) -> RbfDeserializer<R, C> {
        RbfDeserializer::new(reader, self.codec.clone(), Arc::clone(&self.schema))
    }

    #[must_use]
    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.schema.entry_points
    }

    #[must_use]
    pub fn registry(&self) -> &TypeMappingRegistry {
        &self.schema.registry
    }

    /// Serializes the values, in order, into a string.
    #[must_use = "this returns the result of the operation, errors must be handled"]
    pub fn to_string(&self, values: &[Value]) -> Result<String> {
        let mut serializer = self.serializer(Vec::new());
        for value in values {
            serializer.write(value)?;
        }
        let bytes = serializer.into_inner();
        String::from_utf8(bytes).map_err(Error::serialization)
    }

    /// Deserializes every record of `text`; records without content are left out.
    #[must_use = "this returns the result of the operation, errors must be handled"]
    pub fn from_str(&self, text: &str) -> Result<Vec<Value>> {
        let mut deserializer = self.deserializer(text.as_bytes());
        let mut values = Vec::new();
        while deserializer.has_next()? {
            if let Some(value) = deserializer.next()? {
                values.push(value);
            }
        }
        Ok(values)
    }
}

impl RbfIoFactory<CsvCodec> {
    /// Creates a factory for the delimited format.
    pub fn csv(
        registry: impl Into<Arc<TypeMappingRegistry>>,
        entry_points: Vec<EntryPoint>,
        options: CsvOptions,
    ) -> Result<Self> {
        Self::new(registry, entry_points, CsvCodec::new(options))
    }
}

impl RbfIoFactory<FlrCodec> {
    /// Creates a factory for the fixed-length format.
    pub fn flr(
        registry: impl Into<Arc<TypeMappingRegistry>>,
        entry_points: Vec<EntryPoint>,
        options: FlrOptions,
    ) -> Result<Self> {
        Self::new(registry, entry_points, FlrCodec::new(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ComplexTypeMapping, FieldLayout};
    use crate::record;

    fn people() -> TypeMappingRegistry {
        let mut registry = TypeMappingRegistry::with_standard_types();
        registry
            .register(
                ComplexTypeMapping::new("person", "Person")
                    .with_field_layout("name", "string", FieldLayout::fixed(8))
                    .with_field_layout("age", "int", FieldLayout::fixed(3)),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_entry_for_supertype() {
        let mut registry = people();
        registry.register_subtype("Employee", "Person").unwrap();
        let factory = CsvIoFactory::csv(registry, vec![EntryPoint::new("person")], CsvOptions::new()).unwrap();

        let entry = factory.schema.entry_for("Employee").unwrap();
        assert_eq!(entry.data_type_name, "person");
        assert!(factory.schema.entry_for("Robot").is_none());
    }

    #[test]
    fn test_flr_layout_validated() {
        let mut registry = TypeMappingRegistry::with_standard_types();
        registry
            .register(ComplexTypeMapping::new("person", "Person").with_field("name", "string"))
            .unwrap();
        let err = FlrIoFactory::flr(registry, vec![EntryPoint::new("person")], FlrOptions::new())
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_shared_registry() {
        let registry = Arc::new(people());
        let csv = CsvIoFactory::csv(Arc::clone(&registry), vec![EntryPoint::new("person")], CsvOptions::new())
            .unwrap();
        let flr = FlrIoFactory::flr(registry, vec![EntryPoint::new("person")], FlrOptions::new()).unwrap();

        let values = vec![record!("Person" { "name": "Ann", "age": 41 })];
        assert_eq!(csv.to_string(&values).unwrap(), "Ann;41\n");
        assert_eq!(flr.to_string(&values).unwrap(), "Ann     41 \n");
        assert_eq!(flr.from_str("Ann     41 \n").unwrap(), values);
    }
}
