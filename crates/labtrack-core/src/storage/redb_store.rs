//! # redb-backed Storage
//!
//! A disk-backed [`KeyValueStore`] using the redb embedded database.
//!
//! One table maps key strings to value strings. Each `set`/`remove` is its
//! own write transaction, so a value is either fully written or untouched.

use super::KeyValueStore;
use crate::LabTrackError;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;

/// Table for entries: key string -> serialized value string
const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

fn storage_err(e: impl std::fmt::Display) -> LabTrackError {
    LabTrackError::StorageError(e.to_string())
}

/// A disk-backed key-value store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LabTrackError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Create the table up front so read transactions can always open it
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(ENTRIES).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        Ok(Self { db })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>, LabTrackError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(ENTRIES).map_err(storage_err)?;
        let value = table
            .get(key)
            .map_err(storage_err)?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LabTrackError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(ENTRIES).map_err(storage_err)?;
            table.insert(key, value).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }

    fn remove(&self, key: &str) -> Result<(), LabTrackError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(ENTRIES).map_err(storage_err)?;
            table.remove(key).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redb_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labtrack.db");

        {
            let store = RedbStore::open(&path).expect("open");
            store.set("labtrack-lab-tiers", r#"{"rag":"expert"}"#).expect("set");
        }

        let store = RedbStore::open(&path).expect("reopen");
        assert_eq!(
            store.get("labtrack-lab-tiers").expect("get").as_deref(),
            Some(r#"{"rag":"expert"}"#)
        );

        store.remove("labtrack-lab-tiers").expect("remove");
        assert!(store.get("labtrack-lab-tiers").expect("get").is_none());
    }
}
