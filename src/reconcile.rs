//! Reconciliation of the local cache with the canonical store
//!
//! Runs once per session start:
//!
//! 1. Local and remote reads start together.
//! 2. As soon as the local read finishes, a non-empty local collection is
//!    published to the working view (instant first paint).
//! 3. If the remote read succeeds with a non-empty collection, it replaces the
//!    working view in one swap and the local cache is rewritten to mirror it.
//!    Otherwise the local view stays as it is.
//!
//! Remote wins as a whole collection, not per id. Local experiments missing
//! from the remote collection are dropped by step 3; they are reported in
//! [`ReconcileReport::dropped_local`] and logged so the loss is never silent.

use crate::experiment::{Experiment, ExperimentView};
use crate::store::{ExperimentCache, ExperimentStore};

/// What happened to the remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteDecision {
    /// Remote was non-empty and replaced the view.
    Applied {
        /// Experiments in the new view
        count: usize,
    },
    /// Remote answered with no experiments; local view kept.
    Empty,
    /// Remote could not be read; local view kept.
    Unreachable(String),
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Experiments read from the local cache.
    pub local_count: usize,
    /// Remote read result.
    pub remote: RemoteDecision,
    /// Local ids discarded by a remote-wins replace.
    pub dropped_local: Vec<String>,
    /// Whether the local cache now mirrors the remote collection.
    pub local_mirrored: bool,
}

/// Merge the two stores into `view`.
///
/// Never fails: a local read failure reads as an empty cache, a remote read
/// failure leaves the local view in place.
pub async fn reconcile<L, R>(local: &L, remote: &R, view: &ExperimentView) -> ReconcileReport
where
    L: ExperimentCache,
    R: ExperimentStore,
{
    let local_phase = async {
        let experiments = match local.list().await {
            Ok(experiments) => experiments,
            Err(e) => {
                tracing::warn!(error = %e, "local cache unreadable, starting empty");
                Vec::new()
            }
        };
        if !experiments.is_empty() {
            view.replace(experiments.clone());
        }
        experiments
    };

    let (local_experiments, remote_result) = tokio::join!(local_phase, remote.list());
    let local_count = local_experiments.len();

    let remote_experiments = match remote_result {
        Ok(experiments) if experiments.is_empty() => {
            tracing::debug!(local_count, "canonical store empty, keeping local view");
            return ReconcileReport {
                local_count,
                remote: RemoteDecision::Empty,
                dropped_local: Vec::new(),
                local_mirrored: false,
            };
        }
        Ok(experiments) => experiments,
        Err(e) => {
            tracing::warn!(error = %e, local_count, "canonical store unreachable, keeping local view");
            return ReconcileReport {
                local_count,
                remote: RemoteDecision::Unreachable(e.to_string()),
                dropped_local: Vec::new(),
                local_mirrored: false,
            };
        }
    };

    let dropped_local = dropped_ids(&local_experiments, &remote_experiments);
    if !dropped_local.is_empty() {
        tracing::warn!(
            dropped = ?dropped_local,
            "local experiments absent from canonical store are dropped by remote-wins reconciliation"
        );
    }

    view.replace(remote_experiments.clone());

    let local_mirrored = match local.replace_all(&remote_experiments).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "failed to mirror canonical store into local cache");
            false
        }
    };

    tracing::info!(
        count = remote_experiments.len(),
        local_count,
        "working view replaced from canonical store"
    );

    ReconcileReport {
        local_count,
        remote: RemoteDecision::Applied {
            count: remote_experiments.len(),
        },
        dropped_local,
        local_mirrored,
    }
}

fn dropped_ids(local: &[Experiment], remote: &[Experiment]) -> Vec<String> {
    local
        .iter()
        .filter(|l| !remote.iter().any(|r| r.id() == l.id()))
        .map(|l| l.id().to_string())
        .collect()
}
