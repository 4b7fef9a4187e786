//! File-backed store on redb.
//!
//! One table holds every record; the namespaced keys keep the entity
//! ranges disjoint, mirroring the flat LevelDB layout this service grew
//! up with.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, TableDefinition};

use super::{KeyValueStore, StoreError};

/// Records table: namespaced key -> serialized record.
const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Embedded redb database. Cloning shares the underlying handle.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database file and make sure the records table
    /// exists so read paths never race table creation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let txn = db.begin_write()?;
        txn.open_table(RECORDS)?;
        txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RECORDS)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn scan(&self, low: &str, high: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RECORDS)?;

        let mut entries = Vec::new();
        for entry in table.range(low..high)? {
            let (key, value) = entry?;
            entries.push((key.value().to_string(), value.value().to_vec()));
        }
        Ok(entries)
    }
}
