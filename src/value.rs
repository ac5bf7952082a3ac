//! Dynamic object model driven by the record engines.
//!
//! ## Core Types
//!
//! - [`Value`]: any value a field can hold (null, bool, number, string, date, big integer,
//!   list of objects, object)
//! - [`ObjectRef`]: a shared handle to an [`Object`]. Cloning the handle does not copy the
//!   object, so object graphs may share nodes and even contain cycles; the serializer
//!   detects the latter by handle identity.
//! - [`Number`]: integer or floating point number
//!
//! ## Usage Patterns
//!
//! ```rust
//! use rbf_codec::{ObjectRef, Value};
//!
//! let address = ObjectRef::new("Address").with_field("city", "Berlin");
//! let person = ObjectRef::new("Person")
//!     .with_field("name", "Alice")
//!     .with_field("age", 30)
//!     .with_field("address", address);
//!
//! assert_eq!(person.object_type(), "Person");
//! assert_eq!(person.get("name").as_str(), Some("Alice"));
//! assert!(person.get("missing").is_null());
//! ```
//!
//! Typed Rust values convert to and from this model with [`to_value`] and [`from_value`]:
//!
//! ```rust
//! use rbf_codec::{from_value, to_value};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(value.as_object().unwrap().object_type(), "Point");
//! let back: Point = from_value(value).unwrap();
//! assert_eq!(back, Point { x: 1, y: 2 });
//! ```

pub mod de;
pub mod ser;

pub use de::from_value;
pub use ser::{to_value, ValueSerializer};

use crate::FieldMap;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A dynamically-typed field value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    BigInt(BigInt),
    List(Vec<Value>),
    Object(ObjectRef),
}

/// A numeric value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Converts this number to an `i64` if it holds an integral value.
    ///
    /// ```rust
    /// use rbf_codec::Number;
    ///
    /// assert_eq!(Number::Integer(7).as_i64(), Some(7));
    /// assert_eq!(Number::Float(7.0).as_i64(), Some(7));
    /// assert_eq!(Number::Float(7.5).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Integer(i) => Some(i),
            Number::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                Some(f as i64)
            }
            Number::Float(_) => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

/// An object: its runtime type name plus its field values.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    object_type: String,
    fields: FieldMap,
}

impl Object {
    #[must_use]
    pub fn new(object_type: impl Into<String>) -> Self {
        Object {
            object_type: object_type.into(),
            fields: FieldMap::new(),
        }
    }

    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }

    pub(crate) fn into_parts(self) -> (String, FieldMap) {
        (self.object_type, self.fields)
    }
}

/// Shared handle to an [`Object`].
///
/// Equality is structural (two distinct handles to equal objects are equal);
/// [`ObjectRef::ptr_eq`] and [`ObjectRef::id`] expose identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Creates an empty object of the given runtime type.
    #[must_use]
    pub fn new(object_type: impl Into<String>) -> Self {
        Self::from_object(Object::new(object_type))
    }

    #[must_use]
    pub fn from_object(object: Object) -> Self {
        ObjectRef(Arc::new(RwLock::new(object)))
    }

    /// Returns the runtime type name of the object.
    #[must_use]
    pub fn object_type(&self) -> String {
        self.0.read().object_type.clone()
    }

    /// Returns a copy of a field's value, or [`Value::Null`] when the field is not set.
    #[must_use]
    pub fn get(&self, field: &str) -> Value {
        self.0.read().fields.get(field).cloned().unwrap_or_default()
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.write().fields.insert(field.into(), value.into());
    }

    /// Builder-style [`ObjectRef::set`].
    #[must_use]
    pub fn with_field(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Borrows the object for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read()
    }

    /// Returns a deep-enough copy of the object (nested handles are shared).
    #[must_use]
    pub fn snapshot(&self) -> Object {
        self.0.read().clone()
    }

    /// Identity of the object behind this handle.
    #[must_use]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.read() == *other.0.read()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let object = self.0.read();
        f.debug_struct(&object.object_type)
            .field("fields", &object.fields)
            .finish()
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(dt) => Some(dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(bi) => Some(bi),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::BigInt(_) => "big integer",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::BigInt(bi) => write!(f, "{}", bi),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Object(object) => write!(f, "{{{}}}", object.object_type()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::BigInt(bi) => serializer.serialize_str(&bi.to_string()),
            Value::List(items) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(object) => {
                use serde::ser::SerializeMap;
                let object = object.read();
                let mut map = serializer.serialize_map(Some(object.fields.len()))?;
                for (key, value) in object.fields.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match &value {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| crate::Error::custom(format!("cannot convert {} to i64", n))),
            Value::BigInt(bi) => i64::try_from(bi)
                .map_err(|_| crate::Error::custom(format!("{} does not fit into i64", bi))),
            _ => Err(crate::Error::custom(format!(
                "expected integer, found {}",
                value.kind()
            ))),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Number(n) => Ok(n.as_f64()),
            other => Err(crate::Error::custom(format!(
                "expected number, found {}",
                other.kind()
            ))),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(crate::Error::custom(format!(
                "expected bool, found {}",
                other.kind()
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(crate::Error::custom(format!(
                "expected string, found {}",
                other.kind()
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Integer(value as i64))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::Integer(value as i64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}
