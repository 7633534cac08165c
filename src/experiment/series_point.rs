//! Result Series Point - one iteration of a run's fitness trace

use serde::{Deserialize, Serialize};

/// Fitness snapshot after one iteration.
///
/// A series is stored in execution order and never re-sorted; `iteration`
/// starts at 1 and increases by one per point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultSeriesPoint {
    iteration: u32,
    best_fitness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avg_fitness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    std_fitness: Option<f64>,
}

impl ResultSeriesPoint {
    /// Create a point carrying only the best fitness.
    #[must_use]
    pub const fn new(iteration: u32, best_fitness: f64) -> Self {
        Self {
            iteration,
            best_fitness,
            avg_fitness: None,
            std_fitness: None,
        }
    }

    /// Attach population average and standard deviation.
    #[must_use]
    pub const fn with_spread(mut self, avg_fitness: f64, std_fitness: f64) -> Self {
        self.avg_fitness = Some(avg_fitness);
        self.std_fitness = Some(std_fitness);
        self
    }

    /// Iteration number (1-based).
    #[must_use]
    pub const fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Best fitness found so far.
    #[must_use]
    pub const fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    /// Population average fitness, if reported.
    #[must_use]
    pub const fn avg_fitness(&self) -> Option<f64> {
        self.avg_fitness
    }

    /// Population fitness standard deviation, if reported.
    #[must_use]
    pub const fn std_fitness(&self) -> Option<f64> {
        self.std_fitness
    }
}

/// Convergence of a series: first best fitness minus last best fitness.
///
/// Zero for an empty series.
#[must_use]
pub fn convergence(series: &[ResultSeriesPoint]) -> f64 {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => first.best_fitness - last.best_fitness,
        _ => 0.0,
    }
}
