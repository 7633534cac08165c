//! Experiment stores
//!
//! The crate persists experiments into two independently failing stores:
//!
//! ```text
//! Orchestrator ──put──> local cache  (KvExperimentStore<FileKvStore>)  must succeed
//!              └─put──> canonical    (HttpExperimentStore)             best-effort
//! ```
//!
//! Both implement [`ExperimentStore`]. Only the local cache implements
//! [`ExperimentCache`], whose `replace_all` is used by reconciliation to
//! mirror the canonical collection.

mod kv_store;

pub use kv_store::{KvExperimentStore, LocalStore};

use std::future::Future;

use crate::experiment::Experiment;
use crate::Result;

/// Keyed experiment persistence, one record per id.
pub trait ExperimentStore: Send + Sync {
    /// Every stored experiment, oldest first.
    fn list(&self) -> impl Future<Output = Result<Vec<Experiment>>> + Send;

    /// One experiment.
    ///
    /// Fails with [`crate::Error::NotFound`] when the id is absent.
    fn get(&self, id: &str) -> impl Future<Output = Result<Experiment>> + Send;

    /// Store an experiment under its id. Idempotent on id.
    fn put(&self, experiment: &Experiment) -> impl Future<Output = Result<()>> + Send;

    /// Remove an experiment. Deleting an absent id succeeds.
    fn delete(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// A store whose whole collection can be swapped atomically.
pub trait ExperimentCache: ExperimentStore {
    /// Make the store hold exactly `experiments`, in one atomic step.
    fn replace_all(&self, experiments: &[Experiment]) -> impl Future<Output = Result<()>> + Send;
}

/// Order experiments the way `list` reports them.
pub(crate) fn sort_for_listing(experiments: &mut [Experiment]) {
    experiments.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}
