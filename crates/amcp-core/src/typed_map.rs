//! Typed validated mappings.
//!
//! [`TypedMap`] is an insertion-ordered, string-keyed container whose entry
//! type is fixed by its generic parameter. [`UpdatingMap`] is the
//! update-in-place variant: inserting under an existing key assigns the new
//! value into the existing entry (type-checked against the entry's declared
//! type) instead of replacing the entry.

use std::ops::Index;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::{Value, ValueError, ValueType};

/// An entry that carries a declared value type and an optional value.
pub trait Slot {
    /// The declared type of the entry.
    fn value_type(&self) -> ValueType;

    /// The current value, if one has been assigned.
    fn value(&self) -> Option<&Value>;

    /// Assigns a value, rejecting it if its type differs from the declared type.
    fn set_value(&mut self, value: Value) -> Result<(), ValueError>;
}

/// A string-keyed map holding entries of a single type, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TypedMap<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for TypedMap<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> TypedMap<V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the entry it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V> Index<&str> for TypedMap<V> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &str) -> &V {
        &self.entries[key]
    }
}

impl<V> FromIterator<(String, V)> for TypedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A typed map where re-insertion updates the existing entry in place.
///
/// Entries are never replaced once defined, so references handed out by
/// [`UpdatingMap::get`] always describe the first definition of a key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UpdatingMap<V> {
    inner: TypedMap<V>,
}

impl<V> Default for UpdatingMap<V> {
    fn default() -> Self {
        Self {
            inner: TypedMap::new(),
        }
    }
}

impl<V: Slot> UpdatingMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines an entry, or updates the existing one.
    ///
    /// When `key` is already present the entry is kept and only the value
    /// carried by `entry` (if any) is assigned into it. The declared types
    /// must agree.
    pub fn insert(&mut self, key: impl Into<String>, entry: V) -> Result<(), ValueError> {
        let key = key.into();
        match self.inner.get_mut(&key) {
            Some(existing) => {
                if existing.value_type() != entry.value_type() {
                    return Err(ValueError::TypeMismatch {
                        expected: existing.value_type(),
                        found: entry.value_type(),
                    });
                }
                if let Some(value) = entry.value() {
                    existing.set_value(value.clone())?;
                }
                Ok(())
            }
            None => {
                self.inner.insert(key, entry);
                Ok(())
            }
        }
    }

    /// Assigns a value to an existing entry.
    pub fn assign(&mut self, key: &str, value: Value) -> Result<(), ValueError> {
        self.inner
            .get_mut(key)
            .ok_or_else(|| ValueError::UnknownEntry(key.to_string()))?
            .set_value(value)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.inner.iter()
    }
}

impl<V> Index<&str> for UpdatingMap<V> {
    type Output = V;

    fn index(&self, key: &str) -> &V {
        &self.inner[key]
    }
}
