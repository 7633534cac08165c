//! Orchestrator - drives one run request from submission to durable result
//!
//! ```text
//! Validating ──> RunningRemote ──ok──────────────────────> Persisting ──> Done
//!     │               └─fail/timeout─> RunningLocalFallback ──┘     │
//!     └─invalid─> Failed                                        local write
//!                                                               failed ──> Failed
//! ```
//!
//! Only validation and the local write can fail the operation. Remote
//! execution failures divert to the local simulator; remote persistence
//! failures are logged. A run may be cancelled until `Persisting` starts;
//! from then on it always reaches the local write, even if the caller drops
//! the run future.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::config::LabConfig;
use crate::error::ValidationError;
use crate::experiment::{
    find_dataset, BeeParams, Experiment, ExperimentInput, ExperimentView, InputMode, RunOutcome,
    RunRequest, RunResponse, RunState, Snapshot,
};
use crate::reconcile::{reconcile, ReconcileReport};
use crate::remote::{HttpExperimentStore, HttpRemoteRunner, RemoteClient, RemoteRunner};
use crate::simulator::LocalSimulator;
use crate::store::{ExperimentCache, ExperimentStore, LocalStore};
use crate::{Error, Result};

/// Default bound on a remote run call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// A user's request to run an experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSubmission {
    /// Experiment name (must not be blank)
    pub name: String,
    /// Algorithm parameters
    pub params: BeeParams,
    /// Input data; preloaded inputs are resolved against the dataset catalog
    pub input: ExperimentInput,
    /// Id to assign; a fresh UUID when `None`
    pub id: Option<String>,
}

impl RunSubmission {
    /// Create a submission with a generated id.
    #[must_use]
    pub fn new(name: impl Into<String>, params: BeeParams, input: ExperimentInput) -> Self {
        Self {
            name: name.into(),
            params,
            input,
            id: None,
        }
    }

    /// Use a caller-chosen id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// The persisted experiment
    pub experiment: Experiment,
    /// Which producer ran, with the response it returned
    pub outcome: RunOutcome,
    /// True when the canonical store accepted the experiment
    pub remote_persisted: bool,
}

impl RunReport {
    /// Id to navigate to.
    #[must_use]
    pub fn id(&self) -> &str {
        self.experiment.id()
    }

    /// True when the local simulator produced the result.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.outcome.is_fallback()
    }
}

/// Observation and cancellation handle for one run.
#[derive(Debug)]
pub struct RunControl {
    state: watch::Sender<RunState>,
    cancel: watch::Sender<bool>,
}

impl RunControl {
    /// Create a handle in the `Validating` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(RunState::Validating),
            cancel: watch::Sender::new(false),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Ask the run to stop. Has no effect once persisting has begun.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    fn transition(&self, state: RunState) {
        tracing::debug!(?state, "run state");
        self.state.send_replace(state);
    }

    async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|c| *c).await;
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrator over a local cache `L`, canonical store `R` and runner `X`.
///
/// The stores are shared with the persisting task, which outlives a dropped
/// run future.
#[derive(Debug)]
pub struct Orchestrator<L, R, X> {
    local: Arc<L>,
    remote: Arc<R>,
    runner: X,
    simulator: LocalSimulator,
    view: Arc<ExperimentView>,
    remote_timeout: Duration,
}

/// Orchestrator wired to the disk cache and the HTTP services.
pub type DefaultOrchestrator = Orchestrator<LocalStore, HttpExperimentStore, HttpRemoteRunner>;

impl DefaultOrchestrator {
    /// Wire the default stack from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the local cache directory cannot be opened or an
    /// HTTP client cannot be built.
    pub async fn from_config(config: &LabConfig, view: Arc<ExperimentView>) -> Result<Self> {
        let local = LocalStore::open(&config.data_dir).await?;
        let remote = HttpExperimentStore::new(RemoteClient::new(
            config.store_url.clone(),
            config.remote_timeout(),
        )?);
        let runner = HttpRemoteRunner::new(RemoteClient::new(
            config.bee_api_url.clone(),
            config.remote_timeout(),
        )?);
        Ok(Self::new(local, remote, runner, view).with_remote_timeout(config.remote_timeout()))
    }
}

impl<L, R, X> Orchestrator<L, R, X>
where
    L: ExperimentCache + 'static,
    R: ExperimentStore + 'static,
    X: RemoteRunner,
{
    /// Create an orchestrator sharing `view` with other consumers.
    #[must_use]
    pub fn new(local: L, remote: R, runner: X, view: Arc<ExperimentView>) -> Self {
        Self {
            local: Arc::new(local),
            remote: Arc::new(remote),
            runner,
            simulator: LocalSimulator::new(),
            view,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Bound remote run calls by `timeout`; expiry counts as unavailable.
    #[must_use]
    pub const fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// The local cache.
    #[must_use]
    pub fn local(&self) -> &L {
        &self.local
    }

    /// The canonical store.
    #[must_use]
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The shared working view.
    #[must_use]
    pub fn view(&self) -> &Arc<ExperimentView> {
        &self.view
    }

    /// Reconcile the stores into the working view (once per session).
    pub async fn hydrate(&self) -> ReconcileReport {
        reconcile(self.local.as_ref(), self.remote.as_ref(), &self.view).await
    }

    /// Run a submission to completion.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for unusable input and
    /// [`Error::PersistenceFailed`] when the local write fails.
    pub async fn run(&self, submission: RunSubmission) -> Result<RunReport> {
        self.run_with(submission, &RunControl::new()).await
    }

    /// Run a submission, reporting states to and honouring cancellation from
    /// `control`.
    ///
    /// # Errors
    ///
    /// As [`Orchestrator::run`], plus [`Error::Cancelled`] when `control` was
    /// cancelled before persisting began.
    pub async fn run_with(&self, submission: RunSubmission, control: &RunControl) -> Result<RunReport> {
        let result = self.drive(submission, control).await;
        if result.is_err() {
            control.transition(RunState::Failed);
        }
        result
    }

    async fn drive(&self, submission: RunSubmission, control: &RunControl) -> Result<RunReport> {
        control.transition(RunState::Validating);
        let RunSubmission {
            name,
            params,
            input,
            id,
        } = submission;
        let input = validate(&name, &params, input)?;
        if control.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let request = RunRequest { params, input };
        let outcome = tokio::select! {
            outcome = self.execute(&request, control) => outcome,
            () = control.cancelled() => return Err(Error::Cancelled),
        };
        if control.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Past this point the run is never abandoned.
        control.transition(RunState::Persisting);
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let RunRequest { params, input } = request;
        let experiment = Experiment::from_run(
            id,
            name.trim(),
            Utc::now(),
            params,
            input,
            outcome.response().clone(),
        );

        let remote_persisted = tokio::spawn(persist(
            Arc::clone(&self.local),
            Arc::clone(&self.remote),
            Arc::clone(&self.view),
            experiment.clone(),
        ))
        .await
        .map_err(|e| Error::PersistenceFailed(format!("persisting task failed: {e}")))??;

        control.transition(RunState::Done);
        tracing::info!(
            id = experiment.id(),
            fallback = outcome.is_fallback(),
            remote_persisted,
            points = experiment.result_series().len(),
            "experiment persisted"
        );
        Ok(RunReport {
            experiment,
            outcome,
            remote_persisted,
        })
    }

    /// Attempt the remote run; fall back to the simulator on any failure.
    pub async fn execute(&self, request: &RunRequest, control: &RunControl) -> RunOutcome {
        control.transition(RunState::RunningRemote);
        let remote = match tokio::time::timeout(self.remote_timeout, self.runner.run(request)).await {
            Ok(result) => result.and_then(|response| check_response(&request.params, response)),
            Err(_) => Err(Error::RemoteUnavailable(format!(
                "no response within {} ms",
                self.remote_timeout.as_millis()
            ))),
        };

        match remote {
            Ok(response) => RunOutcome::Remote(response),
            Err(e) => {
                tracing::warn!(error = %e, "optimization service failed, using local simulation");
                control.transition(RunState::RunningLocalFallback);
                RunOutcome::Fallback(self.simulator.simulate(&request.params, &request.input))
            }
        }
    }

    /// Delete an experiment everywhere.
    ///
    /// The local copy and view entry are removed first; the canonical delete
    /// is best-effort. Deleting an unknown id succeeds.
    ///
    /// # Errors
    ///
    /// [`Error::PersistenceFailed`] when the local delete fails.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.local.delete(id).await.map_err(|e| match e {
            Error::PersistenceFailed(_) => e,
            other => Error::PersistenceFailed(other.to_string()),
        })?;
        self.view.remove(id);
        if let Err(e) = self.remote.delete(id).await {
            tracing::warn!(id, error = %e, "failed to delete experiment from canonical store");
        }
        Ok(())
    }

    /// One experiment from the view, falling back to the local cache.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when neither holds it.
    pub async fn get(&self, id: &str) -> Result<Experiment> {
        if let Some(experiment) = self.view.get(id) {
            return Ok(experiment);
        }
        self.local.get(id).await
    }

    /// Current working view.
    #[must_use]
    pub fn list(&self) -> Snapshot {
        self.view.snapshot()
    }
}

/// Write the local cache, the view and the canonical store, in that order.
///
/// Runs as its own task so that dropping the run future cannot interrupt it.
/// Returns whether the canonical store accepted the experiment.
async fn persist<L, R>(
    local: Arc<L>,
    remote: Arc<R>,
    view: Arc<ExperimentView>,
    experiment: Experiment,
) -> Result<bool>
where
    L: ExperimentCache,
    R: ExperimentStore,
{
    local.put(&experiment).await.map_err(|e| match e {
        Error::PersistenceFailed(_) => e,
        other => Error::PersistenceFailed(other.to_string()),
    })?;
    view.insert(experiment.clone());

    match remote.put(&experiment).await {
        Ok(()) => Ok(true),
        Err(e) => {
            tracing::warn!(id = experiment.id(), error = %e, "failed to save experiment to canonical store");
            Ok(false)
        }
    }
}

/// Check a submission and resolve preloaded data.
fn validate(
    name: &str,
    params: &BeeParams,
    input: ExperimentInput,
) -> std::result::Result<ExperimentInput, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }

    let input = if input.mode() == InputMode::PreloadedDataset && input.matrix().is_none() {
        let dataset_name = input.dataset_name().unwrap_or_default();
        if dataset_name.is_empty() {
            return Err(ValidationError::MissingData("no dataset selected".to_string()));
        }
        let dataset = find_dataset(dataset_name)
            .ok_or_else(|| ValidationError::UnknownDataset(dataset_name.to_string()))?;
        input.with_matrix(dataset.matrix)
    } else {
        input
    };
    input.validate()?;
    params.validate()?;
    Ok(input)
}

// A remote answer that breaks the series invariants is treated as a failed call.
fn check_response(params: &BeeParams, response: RunResponse) -> Result<RunResponse> {
    let expected = params.max_iterations() as usize;
    if response.result_series.len() != expected {
        return Err(Error::RemoteUnavailable(format!(
            "service returned {} result points, expected {expected}",
            response.result_series.len()
        )));
    }
    let ordered = response
        .result_series
        .iter()
        .zip(1u32..)
        .all(|(p, i)| p.iteration() == i);
    if !ordered {
        return Err(Error::RemoteUnavailable(
            "service returned iterations out of order".to_string(),
        ));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ResultSeriesPoint;

    #[test]
    fn test_validate_name_first() {
        let err = validate(" ", &BeeParams::new(0, 0), ExperimentInput::manual(vec![])).unwrap_err();
        assert_eq!(err, ValidationError::MissingName);
    }

    #[test]
    fn test_validate_resolves_preloaded() {
        let input = validate("run", &BeeParams::new(20, 5), ExperimentInput::preloaded("toy-9x5")).unwrap();
        assert_eq!(input.alternative_count(), 9);
        assert_eq!(input.criteria_count(), 5);
        assert_eq!(input.dataset_name(), Some("toy-9x5"));
    }

    #[test]
    fn test_validate_unknown_dataset() {
        let err = validate("run", &BeeParams::new(20, 5), ExperimentInput::preloaded("iris")).unwrap_err();
        assert_eq!(err, ValidationError::UnknownDataset("iris".to_string()));
    }

    #[test]
    fn test_validate_params_after_data() {
        let err = validate(
            "run",
            &BeeParams::new(20, 0),
            ExperimentInput::manual(vec![vec![1.0]]),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidParams(_)));
    }

    #[test]
    fn test_check_response_length() {
        let response = RunResponse {
            duration_ms: 1,
            kpis: vec![],
            best_solution: None,
            result_series: vec![ResultSeriesPoint::new(1, 1.0)],
        };
        assert!(check_response(&BeeParams::new(1, 1), response.clone()).is_ok());
        assert!(check_response(&BeeParams::new(1, 2), response).is_err());
    }

    #[test]
    fn test_run_control_cancel() {
        let control = RunControl::new();
        assert_eq!(control.state(), RunState::Validating);
        assert!(!control.is_cancelled());
        control.cancel();
        assert!(control.is_cancelled());
    }
}
