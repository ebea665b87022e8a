//! Ordered keyed storage shared by section parsers.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::IngestError;

/// Entries of one section, kept in ingest order with a key index.
///
/// The first value ingested for a key wins; later values are rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SectionEntries<T> {
    items: IndexMap<String, T>,
}

impl<T> Default for SectionEntries<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T> SectionEntries<T> {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value unless the key is already present.
    pub fn insert(&mut self, key: &str, value: T) -> Result<(), IngestError> {
        if self.items.contains_key(key) {
            return Err(IngestError::DuplicateKey {
                key: key.to_string(),
            });
        }
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    /// Returns the value stored under a key.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    /// Returns the key at an ordinal position in ingest order.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.items.get_index(index).map(|(key, _)| key.as_str())
    }

    /// Returns true if the key has been stored.
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Iterates entries in ingest order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> SectionEntries<T> {
    /// Returns a copy of the stored value, or `default` if the key is absent.
    pub fn get_or(&self, key: &str, default: T) -> T {
        self.items.get(key).cloned().unwrap_or(default)
    }
}
