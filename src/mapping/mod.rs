//! The type-mapping model: the schema both record engines interpret.
//!
//! A schema is a [`TypeMappingRegistry`] of named [`TypeMapping`]s plus the
//! [`EntryPoint`]s naming the top-level types a stream may contain.
//!
//! - [`SimpleTypeMapping`]: a single field's text, converted by a [`SimpleTypeConverter`]
//! - [`ComplexTypeMapping`]: an object; its [`FieldMapping`]s are written into the
//!   object's own record, its [`RecordMapping`]s become records of their own
//! - [`ListTypeMapping`]: a polymorphic sequence of objects, each item one record whose
//!   prefix identifies the item's type
//!
//! ## Example
//!
//! ```rust
//! use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, ListTypeMapping, TypeMappingRegistry};
//!
//! let mut registry = TypeMappingRegistry::with_standard_types();
//! registry.register(
//!     ComplexTypeMapping::new("order", "Order")
//!         .with_field("id", "int")
//!         .with_record("customer", "customer", "CU")
//!         .with_list("lines", "order_lines"),
//! ).unwrap();
//! registry.register(ComplexTypeMapping::new("customer", "Customer").with_field("name", "string")).unwrap();
//! registry.register(
//!     ListTypeMapping::new("order_lines")
//!         .with_item("IT", "item", "Item")
//!         .with_item("CM", "comment", "Comment"),
//! ).unwrap();
//! registry.register(ComplexTypeMapping::new("item", "Item").with_field("sku", "string")).unwrap();
//! registry.register(ComplexTypeMapping::new("comment", "Comment").with_field("text", "string")).unwrap();
//!
//! let entry_points = vec![EntryPoint::prefixed("order", "OR")];
//! # let _ = entry_points;
//! ```

pub mod validate;

use crate::access::{DynamicAccessor, ObjectAccessor};
use crate::convert::{
    BigIntConverter, BooleanConverter, DateTimeConverter, FloatConverter, IntegerConverter,
    SimpleTypeConverter, StringConverter,
};
use crate::options::{Align, QuoteMode};
use crate::{Error, Result, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-field encoding hints; unset entries fall back to the format's options.
///
/// The delimited format reads `quote_mode`; the fixed-length format reads `length`,
/// `align` and `pad_character` (and requires `length`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldLayout {
    pub quote_mode: Option<QuoteMode>,
    pub length: Option<usize>,
    pub align: Option<Align>,
    pub pad_character: Option<char>,
}

impl FieldLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a fixed-length field of `length` characters.
    #[must_use]
    pub fn fixed(length: usize) -> Self {
        Self::new().with_length(length)
    }

    #[must_use]
    pub fn with_quote_mode(mut self, mode: QuoteMode) -> Self {
        self.quote_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    #[must_use]
    pub fn with_pad_character(mut self, pad: char) -> Self {
        self.pad_character = Some(pad);
        self
    }
}

/// A field written into its owner's record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldMapping {
    pub data_type_name: String,
    pub field_name: String,
    pub layout: FieldLayout,
}

/// A field written as separate record(s).
///
/// Complex targets require a prefix. List targets carry none: each list item
/// is written with the prefix its [`ListTypeMapping`] assigns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordMapping {
    pub data_type_name: String,
    pub field_name: String,
    pub prefix: Option<String>,
}

/// Leaf mapping: one field's text.
#[derive(Clone, Debug)]
pub struct SimpleTypeMapping {
    data_type_name: String,
    object_type: String,
    converter: Arc<dyn SimpleTypeConverter>,
    format: Vec<String>,
}

impl SimpleTypeMapping {
    pub fn new(
        data_type_name: impl Into<String>,
        object_type: impl Into<String>,
        converter: impl SimpleTypeConverter + 'static,
    ) -> Self {
        SimpleTypeMapping {
            data_type_name: data_type_name.into(),
            object_type: object_type.into(),
            converter: Arc::new(converter),
            format: Vec::new(),
        }
    }

    /// Sets the opaque format passed to the converter.
    #[must_use]
    pub fn with_format<I, S>(mut self, format: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.format = format.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn data_type_name(&self) -> &str {
        &self.data_type_name
    }

    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    #[must_use]
    pub fn format(&self) -> &[String] {
        &self.format
    }

    pub fn to_text(&self, value: &Value) -> Result<Option<String>> {
        self.converter.to_string(value, &self.format)
    }

    pub fn from_text(&self, text: Option<&str>) -> Result<Value> {
        self.converter.from_string(text, &self.format)
    }
}

/// Object mapping: ordered fields plus ordered sub-records.
#[derive(Clone, Debug)]
pub struct ComplexTypeMapping {
    data_type_name: String,
    object_type: String,
    fields: Vec<FieldMapping>,
    records: Vec<RecordMapping>,
    accessor: Arc<dyn ObjectAccessor>,
}

impl ComplexTypeMapping {
    /// Creates a mapping using the [`DynamicAccessor`].
    pub fn new(data_type_name: impl Into<String>, object_type: impl Into<String>) -> Self {
        ComplexTypeMapping {
            data_type_name: data_type_name.into(),
            object_type: object_type.into(),
            fields: Vec::new(),
            records: Vec::new(),
            accessor: Arc::new(DynamicAccessor),
        }
    }

    #[must_use]
    pub fn with_accessor(mut self, accessor: impl ObjectAccessor + 'static) -> Self {
        self.accessor = Arc::new(accessor);
        self
    }

    /// Appends a field with the format's default layout.
    #[must_use]
    pub fn with_field(self, field_name: impl Into<String>, data_type_name: impl Into<String>) -> Self {
        self.with_field_layout(field_name, data_type_name, FieldLayout::default())
    }

    #[must_use]
    pub fn with_field_layout(
        mut self,
        field_name: impl Into<String>,
        data_type_name: impl Into<String>,
        layout: FieldLayout,
    ) -> Self {
        self.fields.push(FieldMapping {
            data_type_name: data_type_name.into(),
            field_name: field_name.into(),
            layout,
        });
        self
    }

    /// Appends a sub-record identified by `prefix`.
    #[must_use]
    pub fn with_record(
        mut self,
        field_name: impl Into<String>,
        data_type_name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        self.records.push(RecordMapping {
            data_type_name: data_type_name.into(),
            field_name: field_name.into(),
            prefix: Some(prefix.into()),
        });
        self
    }

    /// Appends a list of records; item prefixes come from the [`ListTypeMapping`].
    #[must_use]
    pub fn with_list(mut self, field_name: impl Into<String>, list_data_type_name: impl Into<String>) -> Self {
        self.records.push(RecordMapping {
            data_type_name: list_data_type_name.into(),
            field_name: field_name.into(),
            prefix: None,
        });
        self
    }

    #[must_use]
    pub fn data_type_name(&self) -> &str {
        &self.data_type_name
    }

    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    #[must_use]
    pub fn records(&self) -> &[RecordMapping] {
        &self.records
    }

    #[must_use]
    pub fn accessor(&self) -> &dyn ObjectAccessor {
        self.accessor.as_ref()
    }
}

/// One member type of a [`ListTypeMapping`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItem {
    pub prefix: String,
    pub data_type_name: String,
    pub object_type: String,
}

/// Polymorphic, order-preserving list of records.
///
/// Maps each member prefix to a (data type, object type) pair and back.
#[derive(Clone, Debug, Default)]
pub struct ListTypeMapping {
    data_type_name: String,
    items: Vec<ListItem>,
}

impl ListTypeMapping {
    pub fn new(data_type_name: impl Into<String>) -> Self {
        ListTypeMapping {
            data_type_name: data_type_name.into(),
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_item(
        mut self,
        prefix: impl Into<String>,
        data_type_name: impl Into<String>,
        object_type: impl Into<String>,
    ) -> Self {
        self.items.push(ListItem {
            prefix: prefix.into(),
            data_type_name: data_type_name.into(),
            object_type: object_type.into(),
        });
        self
    }

    #[must_use]
    pub fn data_type_name(&self) -> &str {
        &self.data_type_name
    }

    #[must_use]
    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    #[must_use]
    pub fn item_for_prefix(&self, prefix: &str) -> Option<&ListItem> {
        self.items.iter().find(|item| item.prefix == prefix)
    }

    #[must_use]
    pub fn item_for_object_type(&self, object_type: &str) -> Option<&ListItem> {
        self.items.iter().find(|item| item.object_type == object_type)
    }
}

/// The three kinds of schema node.
#[derive(Clone, Debug)]
pub enum TypeMapping {
    Simple(SimpleTypeMapping),
    Complex(ComplexTypeMapping),
    List(ListTypeMapping),
}

impl TypeMapping {
    #[must_use]
    pub fn data_type_name(&self) -> &str {
        match self {
            TypeMapping::Simple(m) => m.data_type_name(),
            TypeMapping::Complex(m) => m.data_type_name(),
            TypeMapping::List(m) => m.data_type_name(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            TypeMapping::Simple(_) => "simple",
            TypeMapping::Complex(_) => "complex",
            TypeMapping::List(_) => "list",
        }
    }
}

impl From<SimpleTypeMapping> for TypeMapping {
    fn from(mapping: SimpleTypeMapping) -> Self {
        TypeMapping::Simple(mapping)
    }
}

impl From<ComplexTypeMapping> for TypeMapping {
    fn from(mapping: ComplexTypeMapping) -> Self {
        TypeMapping::Complex(mapping)
    }
}

impl From<ListTypeMapping> for TypeMapping {
    fn from(mapping: ListTypeMapping) -> Self {
        TypeMapping::List(mapping)
    }
}

/// A top-level type recognized by a serializer or deserializer.
///
/// The prefix (designator) starts every top-level record of a prefixed stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPoint {
    pub data_type_name: String,
    pub prefix: Option<String>,
}

impl EntryPoint {
    /// An entry point for an unprefixed stream (a single record type).
    pub fn new(data_type_name: impl Into<String>) -> Self {
        EntryPoint {
            data_type_name: data_type_name.into(),
            prefix: None,
        }
    }

    pub fn prefixed(data_type_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        EntryPoint {
            data_type_name: data_type_name.into(),
            prefix: Some(prefix.into()),
        }
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Reserved,
    Finished(TypeMapping),
}

/// Named type mappings plus the single-inheritance hierarchy of object types.
///
/// A name may be reserved before its mapping exists, so a schema builder can
/// construct self-referencing schemas: reserve, build children that refer to the
/// name, then register the finished mapping in the reserved slot.
///
/// ```rust
/// use rbf_codec::mapping::{ComplexTypeMapping, ListTypeMapping, TypeMappingRegistry};
///
/// let mut registry = TypeMappingRegistry::with_standard_types();
/// registry.reserve("node").unwrap();
/// registry.register(ListTypeMapping::new("children").with_item("ND", "node", "Node")).unwrap();
/// assert!(registry.is_reserved("node"));
/// registry.register(
///     ComplexTypeMapping::new("node", "Node")
///         .with_field("name", "string")
///         .with_list("children", "children"),
/// ).unwrap();
/// assert!(!registry.is_reserved("node"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct TypeMappingRegistry {
    slots: IndexMap<String, Slot>,
    supertypes: HashMap<String, String>,
}

impl TypeMappingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the standard simple types:
    /// `string`, `int`, `float`, `bool`, `date` and `bigint`.
    #[must_use]
    pub fn with_standard_types() -> Self {
        let mut registry = Self::new();
        let standard = [
            SimpleTypeMapping::new("string", "String", StringConverter),
            SimpleTypeMapping::new("int", "Integer", IntegerConverter),
            SimpleTypeMapping::new("float", "Float", FloatConverter),
            SimpleTypeMapping::new("bool", "Boolean", BooleanConverter),
            SimpleTypeMapping::new("date", "Date", DateTimeConverter),
            SimpleTypeMapping::new("bigint", "BigInt", BigIntConverter),
        ];
        for mapping in standard {
            let name = mapping.data_type_name().to_string();
            registry.slots.insert(name, Slot::Finished(mapping.into()));
        }
        registry
    }

    /// Reserves a name whose mapping is still being built.
    ///
    /// # Errors
    ///
    /// Fails if the name is already reserved or registered.
    pub fn reserve(&mut self, data_type_name: impl Into<String>) -> Result<()> {
        let name = data_type_name.into();
        if self.slots.contains_key(&name) {
            return Err(Error::configuration(format!(
                "data type {} is already registered",
                name
            )));
        }
        self.slots.insert(name, Slot::Reserved);
        Ok(())
    }

    /// Registers a finished mapping, filling its reservation if there is one.
    ///
    /// # Errors
    ///
    /// Fails if a finished mapping with the same name exists.
    pub fn register(&mut self, mapping: impl Into<TypeMapping>) -> Result<()> {
        let mapping = mapping.into();
        let name = mapping.data_type_name().to_string();
        match self.slots.get_mut(&name) {
            Some(Slot::Finished(_)) => Err(Error::configuration(format!(
                "data type {} is already registered",
                name
            ))),
            Some(slot) => {
                *slot = Slot::Finished(mapping);
                Ok(())
            }
            None => {
                self.slots.insert(name, Slot::Finished(mapping));
                Ok(())
            }
        }
    }

    /// Declares `object_type` a subtype of `supertype`.
    ///
    /// # Errors
    ///
    /// Fails if the type already has a supertype or the declaration would make the
    /// hierarchy cyclic.
    pub fn register_subtype(
        &mut self,
        object_type: impl Into<String>,
        supertype: impl Into<String>,
    ) -> Result<()> {
        let object_type = object_type.into();
        let supertype = supertype.into();
        if self.supertypes.contains_key(&object_type) {
            return Err(Error::configuration(format!(
                "object type {} already has a supertype",
                object_type
            )));
        }
        if self.type_chain(&supertype).any(|t| t == object_type) {
            return Err(Error::configuration(format!(
                "declaring {} a subtype of {} makes the type hierarchy cyclic",
                object_type, supertype
            )));
        }
        self.supertypes.insert(object_type, supertype);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, data_type_name: &str) -> Option<&TypeMapping> {
        match self.slots.get(data_type_name) {
            Some(Slot::Finished(mapping)) => Some(mapping),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_reserved(&self, data_type_name: &str) -> bool {
        matches!(self.slots.get(data_type_name), Some(Slot::Reserved))
    }

    /// Names reserved but never registered.
    pub fn reserved_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|(name, slot)| match slot {
            Slot::Reserved => Some(name.as_str()),
            Slot::Finished(_) => None,
        })
    }

    /// All finished mappings, in registration order.
    pub fn mappings(&self) -> impl Iterator<Item = &TypeMapping> {
        self.slots.values().filter_map(|slot| match slot {
            Slot::Finished(mapping) => Some(mapping),
            Slot::Reserved => None,
        })
    }

    /// Looks up a mapping that must exist.
    pub fn resolve(&self, data_type_name: &str) -> Result<&TypeMapping> {
        self.get(data_type_name).ok_or_else(|| {
            Error::configuration(format!("data type {} is not registered", data_type_name))
        })
    }

    pub fn resolve_complex(&self, data_type_name: &str) -> Result<&ComplexTypeMapping> {
        match self.resolve(data_type_name)? {
            TypeMapping::Complex(mapping) => Ok(mapping),
            other => Err(Error::configuration(format!(
                "data type {} is a {} type, expected a complex type",
                data_type_name,
                other.kind()
            ))),
        }
    }

    /// The object type itself followed by its supertypes, nearest first.
    pub fn type_chain<'a>(&'a self, object_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::successors(Some(object_type), move |current| {
            self.supertypes.get(*current).map(String::as_str)
        })
    }

    /// True if the types are equal or one is a supertype of the other.
    #[must_use]
    pub fn is_related(&self, a: &str, b: &str) -> bool {
        self.type_chain(a).any(|t| t == b) || self.type_chain(b).any(|t| t == a)
    }

    /// Finds the list member for an object type, falling back to the nearest supertype.
    pub fn list_item_for<'a>(&self, list: &'a ListTypeMapping, object_type: &str) -> Option<&'a ListItem> {
        self.type_chain(object_type)
            .find_map(|candidate| list.item_for_object_type(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_fills_reservation() {
        let mut registry = TypeMappingRegistry::new();
        registry.reserve("person").unwrap();
        assert!(registry.get("person").is_none());
        assert_eq!(registry.reserved_names().collect::<Vec<_>>(), vec!["person"]);

        registry
            .register(ComplexTypeMapping::new("person", "Person"))
            .unwrap();
        assert!(registry.resolve_complex("person").is_ok());
        assert_eq!(registry.reserved_names().count(), 0);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = TypeMappingRegistry::with_standard_types();
        let err = registry
            .register(SimpleTypeMapping::new("string", "String", StringConverter))
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(registry.reserve("int").is_err());
    }

    #[test]
    fn test_resolve_complex_kind_mismatch() {
        let registry = TypeMappingRegistry::with_standard_types();
        assert!(registry.resolve_complex("int").unwrap_err().is_configuration());
        assert!(registry.resolve("missing").is_err());
    }

    #[test]
    fn test_type_hierarchy() {
        let mut registry = TypeMappingRegistry::new();
        registry.register_subtype("Manager", "Employee").unwrap();
        registry.register_subtype("Employee", "Person").unwrap();

        let chain: Vec<_> = registry.type_chain("Manager").collect();
        assert_eq!(chain, vec!["Manager", "Employee", "Person"]);
        assert!(registry.is_related("Person", "Manager"));
        assert!(!registry.is_related("Person", "Address"));
        assert!(registry.register_subtype("Person", "Manager").is_err());
    }

    #[test]
    fn test_list_item_for_supertype() {
        let mut registry = TypeMappingRegistry::new();
        registry.register_subtype("Manager", "Employee").unwrap();
        let list = ListTypeMapping::new("staff").with_item("EM", "employee", "Employee");

        assert_eq!(
            registry.list_item_for(&list, "Manager").map(|i| i.prefix.as_str()),
            Some("EM")
        );
        assert!(registry.list_item_for(&list, "Robot").is_none());
    }
}
