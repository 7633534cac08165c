//! Run Result - what a run produced and which path produced it

use serde::{Deserialize, Serialize};

use super::{BeeParams, ExperimentInput, Kpi, ResultSeriesPoint, DEFAULT_TRIAL_LIMIT};

/// A run to execute: parameters plus resolved input.
///
/// Serializes in the optimization service's shape, where the parameters are
/// named `numBees`, `iterations`, `feedLimit` and `seed`. Deserializing
/// accepts that shape or the record shape of [`BeeParams`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRequest {
    /// Algorithm parameters
    #[serde(serialize_with = "service_params")]
    pub params: BeeParams,
    /// Resolved input data
    pub input: ExperimentInput,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceParams<'a> {
    num_bees: u32,
    iterations: u32,
    feed_limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lower_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upper_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    objective_function_name: Option<&'a str>,
}

fn service_params<S: serde::Serializer>(params: &BeeParams, serializer: S) -> Result<S::Ok, S::Error> {
    ServiceParams {
        num_bees: params.population_size(),
        iterations: params.max_iterations(),
        feed_limit: params.trial_limit().unwrap_or(DEFAULT_TRIAL_LIMIT),
        seed: params.random_seed(),
        lower_bound: params.lower_bound(),
        upper_bound: params.upper_bound(),
        objective_function_name: params.objective_function_name(),
    }
    .serialize(serializer)
}

/// Output of a run, whether computed remotely or by the local fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// Wall-clock duration reported by the producer
    pub duration_ms: u64,
    /// Headline values, display order
    pub kpis: Vec<Kpi>,
    /// Best solution vector, one component per criterion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_solution: Option<Vec<f64>>,
    /// Fitness trace in execution order
    pub result_series: Vec<ResultSeriesPoint>,
}

/// Which producer a run's result came from.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The optimization service answered.
    Remote(RunResponse),
    /// The service failed and the local simulator stood in.
    Fallback(RunResponse),
}

impl RunOutcome {
    /// The result regardless of path.
    #[must_use]
    pub const fn response(&self) -> &RunResponse {
        match self {
            Self::Remote(r) | Self::Fallback(r) => r,
        }
    }

    /// Consume into the result.
    #[must_use]
    pub fn into_response(self) -> RunResponse {
        match self {
            Self::Remote(r) | Self::Fallback(r) => r,
        }
    }

    /// True when the local fallback produced the result.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Stage of a run request inside the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Checking name, data and params.
    Validating,
    /// Waiting on the optimization service.
    RunningRemote,
    /// Computing the simulated stand-in.
    RunningLocalFallback,
    /// Writing to the local cache, then the canonical store.
    Persisting,
    /// Finished; the experiment is durable locally.
    Done,
    /// Finished without an experiment.
    Failed,
}

impl RunState {
    /// Whether the run can still be abandoned in this state.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(
            self,
            Self::Validating | Self::RunningRemote | Self::RunningLocalFallback
        )
    }

    /// Whether the state is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}
