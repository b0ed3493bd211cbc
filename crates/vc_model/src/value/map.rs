use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use super::Value;
use crate::hash::{FixedHashState, HashMap};

// -----------------------------------------------------------------------------
// Map

/// An insertion-ordered, string-keyed map of [`Value`]s.
///
/// Entries are kept densely in insertion order, with a hash index from key to
/// position. Iteration order is the order in which keys were first inserted,
/// overwriting a key keeps its position.
///
/// Two maps are equal when they hold the same keys mapped to equal values,
/// regardless of order.
///
/// # Examples
///
/// ```
/// use vc_model::value::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert("b", Value::from(1));
/// map.insert("a", Value::from(2));
/// map.insert("b", Value::from(3));
///
/// let keys: Vec<&str> = map.keys().collect();
/// assert_eq!(keys, ["b", "a"]);
/// assert_eq!(map.get("b"), Some(&Value::Int(3)));
/// ```
#[derive(Clone, Default)]
pub struct Map {
    entries: Vec<(String, Value)>,
    indices: HashMap<String, usize>,
}

impl Map {
    /// Creates an empty `Map`.
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            indices: HashMap::with_hasher(FixedHashState),
        }
    }

    /// Creates an empty `Map` with at least the specified capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            indices: HashMap::with_capacity_and_hasher(capacity, FixedHashState),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.indices.contains_key(key)
    }

    /// Gets the position of the given key in insertion order.
    #[inline]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.indices.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.indices.get(key) {
            Some(&index) => Some(&self.entries[index].1),
            None => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self.indices.get(key) {
            Some(&index) => Some(&mut self.entries[index].1),
            None => None,
        }
    }

    /// Inserts a value, returning the previous value for the key if any.
    ///
    /// A new key is appended at the end, an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key: String = key.into();
        if let Some(&index) = self.indices.get(&key) {
            Some(mem::replace(&mut self.entries[index].1, value))
        } else {
            self.indices.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
            None
        }
    }

    /// Removes a key, shifting later entries down to preserve order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.indices.remove(key)?;
        let (_, value) = self.entries.remove(index);
        for position in self.indices.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Some(value)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn values_mut(&mut self) -> impl ExactSizeIterator<Item = &mut Value> {
        self.entries.iter_mut().map(|(_, value)| value)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = Map::with_capacity(iter.size_hint().0);
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Into<String>> Extend<(K, Value)> for Map {
    fn extend<T: IntoIterator<Item = (K, Value)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = alloc::vec::IntoIter<Self::Item>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Map;
    use crate::value::Value;

    #[test]
    fn remove_keeps_order() {
        let mut map: Map = [("a", Value::from(1)), ("b", Value::from(2)), ("c", Value::from(3))]
            .into_iter()
            .collect();

        assert_eq!(map.remove("a"), Some(Value::Int(1)));
        assert_eq!(map.index_of("b"), Some(0));
        assert_eq!(map.index_of("c"), Some(1));

        map.insert("a", Value::Null);
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "c", "a"]);
    }

    #[test]
    fn equality_ignores_order() {
        let left: Map = [("x", Value::from(true)), ("y", Value::Null)].into_iter().collect();
        let right: Map = [("y", Value::Null), ("x", Value::from(true))].into_iter().collect();
        assert_eq!(left, right);

        let shorter: Map = [("x", Value::from(true))].into_iter().collect();
        assert_ne!(left, shorter);
    }
}
