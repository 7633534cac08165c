//! Local Simulator - stand-in results when the optimization service is down
//!
//! Produces a plausible convergent fitness trace so that the persist → view →
//! export flow stays usable offline. It makes no claim of numerical fidelity
//! to the real algorithm.
//!
//! ## Shape of the trace
//!
//! ```text
//! best_0 = 100
//! best_i = max(0, max(0, best_{i-1} - U(0.1, 0.5) * 100/N) + U(-0.01, 0.01))
//! avg_i  = best_i + U(0, 1)
//! std_i  = max(0.001, U(0, 0.2))
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::experiment::{
    convergence, BeeParams, ExperimentInput, Kpi, KpiValue, ResultSeriesPoint, RunResponse,
};

/// Fitness every simulated run starts from.
pub const INITIAL_FITNESS: f64 = 100.0;

fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

/// Fallback result producer. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSimulator;

impl LocalSimulator {
    /// Create a simulator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Simulate a run of `params.max_iterations()` iterations.
    ///
    /// Seeded from `params.random_seed()` when present, so seeded runs are
    /// reproducible.
    #[must_use]
    pub fn simulate(&self, params: &BeeParams, input: &ExperimentInput) -> RunResponse {
        let mut rng = params
            .random_seed()
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let iterations = params.max_iterations();
        let step = INITIAL_FITNESS / f64::from(iterations.max(1));
        let mut best = INITIAL_FITNESS;
        let mut series = Vec::with_capacity(iterations as usize);

        for iteration in 1..=iterations {
            best = (best - rng.gen_range(0.1..0.5) * step).max(0.0);
            best = (best + rng.gen_range(-0.01..0.01)).max(0.0);

            let avg = best + rng.gen_range(0.0..1.0);
            let std = rng.gen_range(0.0..0.2_f64).max(0.001);

            series.push(
                ResultSeriesPoint::new(iteration, round6(best)).with_spread(round6(avg), round6(std)),
            );
        }

        let final_fitness = series.last().map_or(0.0, ResultSeriesPoint::best_fitness);
        let criteria = input.criteria_count();
        let best_solution: Vec<f64> = (0..criteria).map(|_| rng.gen::<f64>()).collect();

        let kpis = vec![
            Kpi::new("Best fitness", final_fitness),
            Kpi::new("Iterations", iterations),
            Kpi::new("Convergence", round6(convergence(&series))),
            Kpi::new("Alternatives", count_value(input.alternative_count())),
            Kpi::new("Criteria", count_value(criteria)),
            Kpi::new("Bees", params.population_size()),
            Kpi::new(
                "Feed Limit",
                params
                    .trial_limit()
                    .map_or_else(|| KpiValue::from("n/a"), KpiValue::from),
            ),
        ];

        RunResponse {
            duration_ms: 0,
            kpis,
            best_solution: Some(best_solution),
            result_series: series,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn count_value(n: usize) -> KpiValue {
    KpiValue::Number(n as f64)
}
