//! Persistent key-value storage for wait-list records.
//!
//! All entities live in one flat, ordered key space partitioned by prefix
//! (`user:`, `verification:`, `referrals:`, `reset:`, `refcode:`). The
//! [`KeyValueStore`] trait is the seam the registry is tested through: the
//! file-backed [`RedbStore`] serves production, the [`MemoryStore`] serves
//! tests and `--ephemeral` runs.

mod memory;
mod redb;

pub use memory::MemoryStore;
pub use redb::RedbStore;

use thiserror::Error;

/// Storage failures. Everything here is a dependency error for callers:
/// the registry reports these as internal failures, never as user outcomes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store at {path}: {source}")]
    Open {
        path: String,
        source: ::redb::DatabaseError,
    },

    #[error("store transaction failed: {0}")]
    Transaction(#[from] ::redb::TransactionError),

    #[error("store table failed: {0}")]
    Table(#[from] ::redb::TableError),

    #[error("store operation failed: {0}")]
    Storage(#[from] ::redb::StorageError),

    #[error("store commit failed: {0}")]
    Commit(#[from] ::redb::CommitError),
}

/// Ordered string-keyed store with prefix-range iteration.
///
/// Individual operations are serialized by the backend; there are no
/// multi-key transactions, so callers must tolerate interleaving between
/// operations (the registry documents where that matters).
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value, `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Insert or overwrite a value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All entries with keys in `[low, high)`, in ascending key order.
    ///
    /// The result is collected at call time: within one scan no entry is
    /// skipped or duplicated, and later writes do not show through.
    fn scan(&self, low: &str, high: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// All entries whose key starts with `prefix`.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        self.scan(prefix, &prefix_end(prefix))
    }
}

/// Smallest string greater than every key starting with `prefix`.
///
/// Prefixes are fixed ASCII (`user:` and friends), so bumping the final
/// byte is exact: `user:` scans as `["user:", "user;")` and covers every
/// email, unlike the `~` sentinel which misses keys containing `~`.
fn prefix_end(prefix: &str) -> String {
    let mut end = prefix.to_string();
    match end.pop() {
        Some(last) => {
            end.push((last as u8 + 1) as char);
            end
        }
        None => end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_end_bumps_final_byte() {
        assert_eq!(prefix_end("user:"), "user;");
        assert_eq!(prefix_end("referrals:"), "referrals;");
    }

    #[test]
    fn prefix_end_empty_prefix_stays_empty() {
        assert_eq!(prefix_end(""), "");
    }

    #[test]
    fn scan_prefix_covers_tilde_keys() {
        let store = MemoryStore::new();
        store.put("user:a~b@x.com", b"1").unwrap();
        store.put("user:z@x.com", b"2").unwrap();
        store.put("verification:a@x.com", b"3").unwrap();

        let users = store.scan_prefix("user:").unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].0, "user:a~b@x.com");
        assert_eq!(users[1].0, "user:z@x.com");
    }
}
