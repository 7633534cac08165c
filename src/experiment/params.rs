//! Bee Params - algorithm configuration for a run

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on `max_iterations` accepted for a run.
pub const MAX_ITERATIONS_LIMIT: u32 = 1000;

/// Trial limit sent to the optimization service when a run sets none.
pub const DEFAULT_TRIAL_LIMIT: u32 = 10;

/// Parameters of a bee-colony optimization run.
///
/// Immutable once a run starts; construct through [`BeeParams::builder`].
/// Records written with the service's field names (`numBees`, `iterations`,
/// `feedLimit`, `seed`) decode as well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BeeParams {
    #[serde(alias = "numBees")]
    population_size: u32,
    #[serde(alias = "iterations")]
    max_iterations: u32,
    #[serde(default, alias = "feedLimit", skip_serializing_if = "Option::is_none")]
    trial_limit: Option<u32>,
    #[serde(default, alias = "seed", skip_serializing_if = "Option::is_none")]
    random_seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lower_bound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    upper_bound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_function_name: Option<String>,
}

impl BeeParams {
    /// Create params with the two required fields.
    #[must_use]
    pub const fn new(population_size: u32, max_iterations: u32) -> Self {
        Self {
            population_size,
            max_iterations,
            trial_limit: None,
            random_seed: None,
            lower_bound: None,
            upper_bound: None,
            objective_function_name: None,
        }
    }

    /// Create a builder for params with optional fields.
    #[must_use]
    pub const fn builder(population_size: u32, max_iterations: u32) -> BeeParamsBuilder {
        BeeParamsBuilder {
            params: Self::new(population_size, max_iterations),
        }
    }

    /// Number of bees in the colony.
    #[must_use]
    pub const fn population_size(&self) -> u32 {
        self.population_size
    }

    /// Number of iterations the run executes.
    #[must_use]
    pub const fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Abandonment limit for a food source, if set.
    #[must_use]
    pub const fn trial_limit(&self) -> Option<u32> {
        self.trial_limit
    }

    /// Seed for reproducible runs, if set.
    #[must_use]
    pub const fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    /// Lower search bound, if set.
    #[must_use]
    pub const fn lower_bound(&self) -> Option<f64> {
        self.lower_bound
    }

    /// Upper search bound, if set.
    #[must_use]
    pub const fn upper_bound(&self) -> Option<f64> {
        self.upper_bound
    }

    /// Name of the objective function, if set.
    #[must_use]
    pub fn objective_function_name(&self) -> Option<&str> {
        self.objective_function_name.as_deref()
    }

    /// Check ranges before a run is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidParams`] when the population is empty,
    /// the iteration count is outside `1..=1000`, or the bounds are inverted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.population_size == 0 {
            return Err(ValidationError::InvalidParams(
                "populationSize must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_ITERATIONS_LIMIT).contains(&self.max_iterations) {
            return Err(ValidationError::InvalidParams(format!(
                "maxIterations must be within 1..={MAX_ITERATIONS_LIMIT}, got {}",
                self.max_iterations
            )));
        }
        if let (Some(lo), Some(hi)) = (self.lower_bound, self.upper_bound) {
            if lo.is_nan() || hi.is_nan() || lo >= hi {
                return Err(ValidationError::InvalidParams(format!(
                    "lowerBound ({lo}) must be below upperBound ({hi})"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for `BeeParams`.
#[derive(Debug)]
pub struct BeeParamsBuilder {
    params: BeeParams,
}

impl BeeParamsBuilder {
    /// Set the trial (abandonment) limit.
    #[must_use]
    pub const fn trial_limit(mut self, limit: u32) -> Self {
        self.params.trial_limit = Some(limit);
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn random_seed(mut self, seed: u64) -> Self {
        self.params.random_seed = Some(seed);
        self
    }

    /// Set both search bounds.
    #[must_use]
    pub const fn bounds(mut self, lower: f64, upper: f64) -> Self {
        self.params.lower_bound = Some(lower);
        self.params.upper_bound = Some(upper);
        self
    }

    /// Set the objective function name.
    #[must_use]
    pub fn objective_function_name(mut self, name: impl Into<String>) -> Self {
        self.params.objective_function_name = Some(name.into());
        self
    }

    /// Build the `BeeParams`.
    #[must_use]
    pub fn build(self) -> BeeParams {
        self.params
    }
}
