//! Local key-value persistence for offline access.
//!
//! The inventory snapshot and the lookup history survive restarts through a
//! `Store`. Values are JSON blobs written and read back with the same
//! `serde_json` format, so the backing medium only moves strings around.
//!
//! Backends:
//! - `FileStore`: one JSON file per key in the data directory
//! - `MemoryStore`: process-local map, used by tests and embedders

pub mod error;
pub mod file;
pub mod memory;

use serde::{de::DeserializeOwned, Serialize};

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Serialized product list of the last successful fetch.
pub const SNAPSHOT_KEY: &str = "inventory.snapshot";

/// RFC 3339 timestamp of when `SNAPSHOT_KEY` was fetched.
pub const SNAPSHOT_AS_OF_KEY: &str = "inventory.snapshotAsOf";

/// Serialized history ledger, most recent first.
pub const HISTORY_KEY: &str = "history.entries";

/// Synchronous named-blob storage.
///
/// Implementations must never expose a partially written value to `get`.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Drop every key this store holds.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Read and deserialize a JSON value. Absent keys are `Ok(None)`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn Store,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(contents) => {
            let value = serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serialize a value to JSON and write it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn Store,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let contents = serde_json::to_string(value)?;
    store.set(key, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    #[test]
    fn test_json_round_trip_preserves_order() {
        let store = MemoryStore::new();
        let products = vec![
            Product::new("A1", "Red Pen", "120", "100"),
            Product::new("B2", "Blue Pen", "$130", "$110"),
            Product::new("", "", "", ""),
        ];

        save_json(&store, SNAPSHOT_KEY, &products).unwrap();
        let loaded: Vec<Product> = load_json(&store, SNAPSHOT_KEY).unwrap().unwrap();

        assert_eq!(loaded, products);
    }

    #[test]
    fn test_load_json_absent_key() {
        let store = MemoryStore::new();
        let loaded: Option<Vec<Product>> = load_json(&store, HISTORY_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_json_corrupt_blob() {
        let store = MemoryStore::new();
        store.set(HISTORY_KEY, "{not json").unwrap();

        let result: Result<Option<Vec<Product>>, _> = load_json(&store, HISTORY_KEY);
        assert!(matches!(result, Err(StoreError::Corrupt { ref key, .. }) if key == HISTORY_KEY));
    }
}
