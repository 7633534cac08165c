//! Key-Value Store Module
//!
//! Byte-oriented storage underneath the experiment stores:
//! - Atomic single-key get/set/delete (delete is idempotent)
//! - Key enumeration for listing
//! - Whole-collection replacement as one atomic step
//!
//! Two backends ship with the crate: [`MemoryKvStore`] (lost on restart) and
//! [`FileKvStore`] (one file per key, survives restarts).
//!
//! # Example
//!
//! ```rust,no_run
//! use beelab::kv::{KvStore, MemoryKvStore};
//!
//! # async fn example() -> beelab::Result<()> {
//! let store = MemoryKvStore::new();
//!
//! // Basic operations
//! store.set("key", b"value".to_vec()).await?;
//! let value = store.get("key").await?;
//! assert_eq!(value, Some(b"value".to_vec()));
//!
//! store.delete("key").await?;
//! assert!(!store.exists("key").await?);
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;

use crate::Result;
use std::future::Future;

/// Key-value store trait backing the experiment stores.
///
/// Implementations must make `set` and `delete` atomic per key, so that
/// concurrent callers never observe a torn value.
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Set a value for a key.
    ///
    /// Overwrites any existing value.
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// No-op if the key doesn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// All keys currently stored, sorted.
    fn keys(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Replace the entire contents with `entries` in one atomic step.
    ///
    /// Readers see either the old collection or the new one, never a mix.
    fn replace_all(
        &self,
        entries: Vec<(String, Vec<u8>)>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Get multiple keys in a batch.
    ///
    /// Returns values in the same order as keys. Missing keys return `None`.
    fn batch_get(
        &self,
        keys: &[String],
    ) -> impl Future<Output = Result<Vec<Option<Vec<u8>>>>> + Send {
        async move {
            let mut results = Vec::with_capacity(keys.len());
            for key in keys {
                results.push(self.get(key).await?);
            }
            Ok(results)
        }
    }
}
