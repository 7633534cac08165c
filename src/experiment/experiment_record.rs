//! Experiment - the aggregate root of a completed run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BeeParams, ExperimentInput, Kpi, ResultSeriesPoint, RunResponse};

/// One completed optimization run with its inputs, parameters and results.
///
/// Experiments are immutable once built. The only lifecycle operation after
/// creation is deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    duration_ms: u64,
    params: BeeParams,
    input: ExperimentInput,
    kpis: Vec<Kpi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    best_solution: Option<Vec<f64>>,
    result_series: Vec<ResultSeriesPoint>,
}

impl Experiment {
    /// Create a builder with the required fields.
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        params: BeeParams,
        input: ExperimentInput,
    ) -> ExperimentBuilder {
        ExperimentBuilder::new(id, name, params, input)
    }

    /// Assemble an experiment from a finished run.
    #[must_use]
    pub fn from_run(
        id: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        params: BeeParams,
        input: ExperimentInput,
        response: RunResponse,
    ) -> Self {
        Self::builder(id, name, params, input)
            .created_at(created_at)
            .duration_ms(response.duration_ms)
            .kpis(response.kpis)
            .best_solution(response.best_solution)
            .result_series(response.result_series)
            .build()
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the run duration in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Get the run parameters.
    #[must_use]
    pub const fn params(&self) -> &BeeParams {
        &self.params
    }

    /// Get the input data.
    #[must_use]
    pub const fn input(&self) -> &ExperimentInput {
        &self.input
    }

    /// KPIs in display order.
    #[must_use]
    pub fn kpis(&self) -> &[Kpi] {
        &self.kpis
    }

    /// Best solution vector, if the producer reported one.
    #[must_use]
    pub fn best_solution(&self) -> Option<&[f64]> {
        self.best_solution.as_deref()
    }

    /// Fitness trace in execution order.
    #[must_use]
    pub fn result_series(&self) -> &[ResultSeriesPoint] {
        &self.result_series
    }
}

/// Builder for `Experiment`.
#[derive(Debug)]
pub struct ExperimentBuilder {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    duration_ms: u64,
    params: BeeParams,
    input: ExperimentInput,
    kpis: Vec<Kpi>,
    best_solution: Option<Vec<f64>>,
    result_series: Vec<ResultSeriesPoint>,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        params: BeeParams,
        input: ExperimentInput,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: Utc::now(),
            duration_ms: 0,
            params,
            input,
            kpis: Vec::new(),
            best_solution: None,
            result_series: Vec::new(),
        }
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the run duration.
    #[must_use]
    pub const fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the KPIs.
    #[must_use]
    pub fn kpis(mut self, kpis: Vec<Kpi>) -> Self {
        self.kpis = kpis;
        self
    }

    /// Set the best solution vector.
    #[must_use]
    pub fn best_solution(mut self, best_solution: Option<Vec<f64>>) -> Self {
        self.best_solution = best_solution;
        self
    }

    /// Set the result series.
    #[must_use]
    pub fn result_series(mut self, result_series: Vec<ResultSeriesPoint>) -> Self {
        self.result_series = result_series;
        self
    }

    /// Build the `Experiment`.
    #[must_use]
    pub fn build(self) -> Experiment {
        Experiment {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            duration_ms: self.duration_ms,
            params: self.params,
            input: self.input,
            kpis: self.kpis,
            best_solution: self.best_solution,
            result_series: self.result_series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Experiment {
        Experiment::builder(
            "exp-1",
            "Test",
            BeeParams::new(20, 2),
            ExperimentInput::manual(vec![vec![1.0, 2.0]]),
        )
        .kpis(vec![Kpi::new("Best fitness", 1.0)])
        .result_series(vec![
            ResultSeriesPoint::new(1, 2.0),
            ResultSeriesPoint::new(2, 1.0),
        ])
        .build()
    }

    #[test]
    fn test_experiment_builder() {
        let exp = sample();
        assert_eq!(exp.id(), "exp-1");
        assert_eq!(exp.name(), "Test");
        assert_eq!(exp.result_series().len(), 2);
        assert!(exp.best_solution().is_none());
    }

    #[test]
    fn test_experiment_json_round_trip() {
        let exp = sample();
        let json = serde_json::to_string(&exp).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"resultSeries\""));
        let back: Experiment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, exp);
    }
}
