//! In-memory store for tests and `--ephemeral` runs.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::{KeyValueStore, StoreError};

/// `BTreeMap` behind an `RwLock`; same ordering and scan semantics as the
/// file-backed store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        records.remove(key);
        Ok(())
    }

    fn scan(&self, low: &str, high: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .range(low.to_string()..high.to_string())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
