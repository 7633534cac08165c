//! Experiment View - the in-memory working collection shared by consumers
//!
//! The view is an owned object handed to whoever needs it (orchestrator,
//! reconciler, HTTP handlers). Readers take cheap snapshots or subscribe to
//! changes; every mutation publishes a complete new collection, so readers
//! never observe a half-applied update.

use std::sync::Arc;

use tokio::sync::watch;

use super::Experiment;

/// Immutable snapshot of the working collection.
pub type Snapshot = Arc<Vec<Experiment>>;

/// Working view of experiments, insertion ordered, unique by id.
#[derive(Debug)]
pub struct ExperimentView {
    tx: watch::Sender<Snapshot>,
}

impl ExperimentView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tx }
    }

    /// Current collection.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver notified on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Number of experiments in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    /// Check if the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Look up an experiment by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Experiment> {
        self.tx.borrow().iter().find(|e| e.id() == id).cloned()
    }

    /// Swap the whole collection in one step.
    ///
    /// Later duplicates of an id are dropped.
    pub fn replace(&self, experiments: Vec<Experiment>) {
        self.tx.send_replace(Arc::new(dedup(experiments)));
    }

    /// Add an experiment, replacing any entry with the same id in place.
    pub fn insert(&self, experiment: Experiment) {
        self.tx.send_modify(|current| {
            let mut next: Vec<Experiment> = (**current).clone();
            match next.iter().position(|e| e.id() == experiment.id()) {
                Some(i) => next[i] = experiment,
                None => next.push(experiment),
            }
            *current = Arc::new(next);
        });
    }

    /// Remove an experiment; returns whether it was present.
    pub fn remove(&self, id: &str) -> bool {
        self.tx.send_if_modified(|current| {
            if !current.iter().any(|e| e.id() == id) {
                return false;
            }
            let next: Vec<Experiment> = current.iter().filter(|e| e.id() != id).cloned().collect();
            *current = Arc::new(next);
            true
        })
    }

    /// Ids in view order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.tx.borrow().iter().map(|e| e.id().to_string()).collect()
    }
}

impl Default for ExperimentView {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup(experiments: Vec<Experiment>) -> Vec<Experiment> {
    let mut seen = std::collections::HashSet::new();
    experiments
        .into_iter()
        .filter(|e| seen.insert(e.id().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{BeeParams, ExperimentInput};

    fn exp(id: &str) -> Experiment {
        Experiment::builder(
            id,
            format!("exp {id}"),
            BeeParams::new(10, 1),
            ExperimentInput::manual(vec![vec![1.0]]),
        )
        .build()
    }

    #[test]
    fn test_view_default() {
        let view = ExperimentView::default();
        assert!(view.is_empty());
        assert_eq!(view.len(), 0);
    }

    #[test]
    fn test_insert_remove() {
        let view = ExperimentView::new();
        view.insert(exp("a"));
        view.insert(exp("b"));
        view.insert(exp("a"));
        assert_eq!(view.ids(), vec!["a", "b"]);

        assert!(view.remove("a"));
        assert!(!view.remove("a"));
        assert_eq!(view.ids(), vec!["b"]);
        assert!(view.get("b").is_some());
    }

    #[test]
    fn test_replace_dedups() {
        let view = ExperimentView::new();
        view.insert(exp("old"));
        view.replace(vec![exp("x"), exp("y"), exp("x")]);
        assert_eq!(view.ids(), vec!["x", "y"]);
    }

    #[test]
    fn test_snapshot_is_stable_across_updates() {
        let view = ExperimentView::new();
        view.insert(exp("a"));
        let before = view.snapshot();
        view.replace(vec![exp("b")]);
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].id(), "a");
        assert_eq!(view.snapshot()[0].id(), "b");
    }

    #[tokio::test]
    async fn test_subscribe_sees_replace() {
        let view = ExperimentView::new();
        let mut rx = view.subscribe();
        view.replace(vec![exp("b"), exp("c")]);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 2);
    }
}
