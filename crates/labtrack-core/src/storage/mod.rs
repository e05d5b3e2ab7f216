//! # Key-Value Storage
//!
//! Durable, string-keyed storage of serialized blobs.
//!
//! Every persisted cell in labtrack (progress, tiers, preferences) is one
//! JSON string under one key. Backends only move strings; parsing and
//! defaulting happen in [`crate::events::StoredValue`].
//!
//! ## Backends
//!
//! - [`MemoryStore`]: volatile, for tests and `--backend memory`
//! - [`RedbStore`]: disk-backed redb database (ACID, crash safe)

mod redb_store;

pub use redb_store::RedbStore;

use crate::LabTrackError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// String-keyed get/set/remove shared by every mounted view.
///
/// Calls are synchronous. Implementations must be usable from several
/// threads at once (the HTTP server shares one store between tasks).
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Read the value under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, LabTrackError>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), LabTrackError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), LabTrackError>;
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw entries.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LabTrackError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LabTrackError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LabTrackError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").expect("get").is_none());

        store.set("k", "v1").expect("set");
        store.set("k", "v2").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.remove("k").expect("remove");
        store.remove("k").expect("remove absent");
        assert!(store.is_empty());
    }

    #[test]
    fn with_entries_seeds_values() {
        let store = MemoryStore::with_entries([("a", "1"), ("b", "2")]);
        assert_eq!(store.get("b").expect("get").as_deref(), Some("2"));
    }
}
