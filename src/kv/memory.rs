//! In-memory KV store implementation using `DashMap`.
//!
//! Data is lost on process restart; use [`super::FileKvStore`] for a cache
//! that must survive one.

use super::KvStore;
use crate::Result;
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory key-value store using lock-free concurrent hashmap.
///
/// Single-key operations run against the `DashMap` while holding the outer
/// lock for reading. `replace_all` takes it for writing to swap in a fresh
/// map, so every single-key operation lands wholly before or after a swap.
///
/// # Example
///
/// ```rust
/// use beelab::kv::{KvStore, MemoryKvStore};
///
/// # async fn example() -> beelab::Result<()> {
/// let store = MemoryKvStore::new();
/// store.set("hello", b"world".to_vec()).await?;
/// assert_eq!(store.get("hello").await?, Some(b"world".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryKvStore {
    store: RwLock<Arc<DashMap<String, Vec<u8>>>>,
}

impl MemoryKvStore {
    /// Create a new in-memory KV store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Arc::new(DashMap::new())),
        }
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: RwLock::new(Arc::new(DashMap::with_capacity(capacity))),
        }
    }

    fn with_map<T>(&self, f: impl FnOnce(&DashMap<String, Vec<u8>>) -> T) -> T {
        let guard = self.store.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Get the number of entries in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_map(DashMap::len)
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with_map(DashMap::is_empty)
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.with_map(DashMap::clear);
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.with_map(|map| map.get(key).map(|v| v.value().clone())))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.with_map(|map| map.insert(key.to_string(), value));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.with_map(|map| map.remove(key));
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.with_map(|map| map.contains_key(key)))
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.with_map(|map| map.iter().map(|e| e.key().clone()).collect());
        keys.sort();
        Ok(keys)
    }

    async fn replace_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        let next: DashMap<String, Vec<u8>> = entries.into_iter().collect();
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        Ok(())
    }
}
