//! Ordered field map of a dynamic object.
//!
//! [`FieldMap`] wraps an [`IndexMap`] so an object's fields iterate in the order they
//! were set. The record engines never depend on that order (they follow the type
//! mapping), but it keeps debug output and serde round trips deterministic.
//!
//! ## Examples
//!
//! ```rust
//! use rbf_codec::{FieldMap, Value};
//!
//! let mut map = FieldMap::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::Value;
use indexmap::IndexMap;

/// An ordered map of field names to values.
#[derive(Debug, Clone, Default)]
pub struct FieldMap(IndexMap<String, Value>);

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        FieldMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        FieldMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a field, returning the previous value if the field was already set.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Removes a field, keeping the order of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Iterates over the fields whose value is not [`Value::Null`].
    pub fn present(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(_, value)| !value.is_null())
    }
}

/// Two maps are equal when they hold the same non-null fields, in any order.
///
/// An absent field and a field set to [`Value::Null`] are indistinguishable on the wire,
/// so they compare equal here as well.
impl PartialEq for FieldMap {
    fn eq(&self, other: &Self) -> bool {
        self.present().count() == other.present().count()
            && self
                .present()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, Value)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        FieldMap(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_fields_ignored_by_equality() {
        let mut left = FieldMap::new();
        left.insert("a".to_string(), Value::from(1));
        left.insert("b".to_string(), Value::Null);

        let mut right = FieldMap::new();
        right.insert("a".to_string(), Value::from(1));

        assert_eq!(left, right);
        assert_eq!(right, left);
    }

    #[test]
    fn test_order_insensitive_equality() {
        let left: FieldMap = vec![
            ("a".to_string(), Value::from(1)),
            ("b".to_string(), Value::from("x")),
        ]
        .into_iter()
        .collect();
        let right: FieldMap = vec![
            ("b".to_string(), Value::from("x")),
            ("a".to_string(), Value::from(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut map: FieldMap = vec![
            ("a".to_string(), Value::from(1)),
            ("b".to_string(), Value::from(2)),
            ("c".to_string(), Value::from(3)),
        ]
        .into_iter()
        .collect();
        map.remove("b");
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
