//! Ordered map keyed by schema name.
//!
//! [`SchemaMap`] wraps an [`IndexMap`] so schemas come out in the order they
//! were first materialized, which keeps written documents and test output
//! deterministic.
//!
//! ## Examples
//!
//! ```rust
//! use serde_mtcsv::SchemaMap;
//!
//! let mut map = SchemaMap::new();
//! map.insert("Fruit".to_string(), 3);
//! map.insert("Color".to_string(), 5);
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, vec!["Fruit", "Color"]);
//! assert_eq!(map.get("Color"), Some(&5));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An insertion-ordered map from schema name to `V`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaMap<V>(IndexMap<String, V>);

impl<V> SchemaMap<V> {
    #[must_use]
    pub fn new() -> Self {
        SchemaMap(IndexMap::new())
    }

    /// Inserts a value, returning the previous one for the same schema.
    pub fn insert(&mut self, schema: String, value: V) -> Option<V> {
        self.0.insert(schema, value)
    }

    #[must_use]
    pub fn get(&self, schema: &str) -> Option<&V> {
        self.0.get(schema)
    }

    pub fn get_mut(&mut self, schema: &str) -> Option<&mut V> {
        self.0.get_mut(schema)
    }

    #[must_use]
    pub fn contains_key(&self, schema: &str) -> bool {
        self.0.contains_key(schema)
    }

    /// Returns the value for `schema`, inserting `V::default()` first if absent.
    pub fn entry_or_default(&mut self, schema: &str) -> &mut V
    where
        V: Default,
    {
        self.0.entry(schema.to_string()).or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, V> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, V> {
        self.0.values()
    }

    pub fn values_mut(&mut self) -> indexmap::map::ValuesMut<'_, String, V> {
        self.0.values_mut()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, V> {
        self.0.iter()
    }
}

impl<V> Default for SchemaMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IntoIterator for SchemaMap<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a SchemaMap<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = indexmap::map::Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<V> FromIterator<(String, V)> for SchemaMap<V> {
    fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
        SchemaMap(IndexMap::from_iter(iter))
    }
}

impl<V> From<SchemaMap<V>> for IndexMap<String, V> {
    fn from(map: SchemaMap<V>) -> Self {
        map.0
    }
}
