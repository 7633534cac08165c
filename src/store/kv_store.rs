//! Experiment store over any [`KvStore`]: JSON records keyed by experiment id.

use std::path::PathBuf;

use super::{sort_for_listing, ExperimentCache, ExperimentStore};
use crate::experiment::Experiment;
use crate::kv::{FileKvStore, KvStore};
use crate::{Error, Result};

/// The durable local cache.
pub type LocalStore = KvExperimentStore<FileKvStore>;

/// Experiment store that serializes each experiment into one KV record.
#[derive(Debug)]
pub struct KvExperimentStore<S: KvStore> {
    kv: S,
}

impl<S: KvStore> KvExperimentStore<S> {
    /// Wrap a key-value backend.
    #[must_use]
    pub const fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Get reference to inner store (for inspection/testing)
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.kv
    }
}

impl LocalStore {
    /// Open the disk-backed cache under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] if the directory is unusable.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(FileKvStore::open(dir).await?))
    }
}

fn encode(experiment: &Experiment) -> Result<Vec<u8>> {
    serde_json::to_vec(experiment).map_err(|e| {
        Error::PersistenceFailed(format!("failed to encode experiment {}: {e}", experiment.id()))
    })
}

fn decode(id: &str, bytes: &[u8]) -> Result<Experiment> {
    serde_json::from_slice(bytes)
        .map_err(|e| Error::PersistenceFailed(format!("corrupt record for experiment {id}: {e}")))
}

impl<S: KvStore> ExperimentStore for KvExperimentStore<S> {
    async fn list(&self) -> Result<Vec<Experiment>> {
        let keys = self.kv.keys().await?;
        let values = self.kv.batch_get(&keys).await?;

        let mut experiments = Vec::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            // A key deleted between keys() and batch_get() is simply gone.
            let Some(bytes) = value else { continue };
            match decode(key, &bytes) {
                Ok(experiment) => experiments.push(experiment),
                Err(e) => tracing::warn!(id = %key, error = %e, "skipping unreadable experiment record"),
            }
        }
        sort_for_listing(&mut experiments);
        Ok(experiments)
    }

    async fn get(&self, id: &str) -> Result<Experiment> {
        match self.kv.get(id).await? {
            Some(bytes) => decode(id, &bytes),
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    async fn put(&self, experiment: &Experiment) -> Result<()> {
        let bytes = encode(experiment)?;
        self.kv.set(experiment.id(), bytes).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.kv.delete(id).await
    }
}

impl<S: KvStore> ExperimentCache for KvExperimentStore<S> {
    async fn replace_all(&self, experiments: &[Experiment]) -> Result<()> {
        let entries = experiments
            .iter()
            .map(|e| Ok((e.id().to_string(), encode(e)?)))
            .collect::<Result<Vec<_>>>()?;
        self.kv.replace_all(entries).await
    }
}
