//! Experiment data model
//!
//! Immutable value types describing a run's configuration and output, plus
//! the shared in-memory working view.
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment ──┬── BeeParams
//!              ├── ExperimentInput (matrix | dataset name | upload metadata)
//!              ├──< Kpi (N) [display order]
//!              └──< ResultSeriesPoint (N) [execution order]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use beelab::experiment::{BeeParams, Experiment, ExperimentInput, Kpi, ResultSeriesPoint};
//!
//! let params = BeeParams::builder(20, 2).trial_limit(10).build();
//! let input = ExperimentInput::manual(vec![vec![0.2, 0.8], vec![0.5, 0.5]]);
//!
//! let experiment = Experiment::builder("exp-001", "My Experiment", params, input)
//!     .kpis(vec![Kpi::new("Best fitness", 41.5)])
//!     .result_series(vec![
//!         ResultSeriesPoint::new(1, 80.0),
//!         ResultSeriesPoint::new(2, 41.5),
//!     ])
//!     .build();
//!
//! assert_eq!(experiment.result_series().len(), 2);
//! ```

mod datasets;
mod experiment_record;
mod input;
mod kpi;
mod params;
mod run_result;
mod series_point;
mod view;

pub use datasets::{find_dataset, preloaded_datasets, PreloadedDataset, DATASET_NAMES};
pub use experiment_record::{Experiment, ExperimentBuilder};
pub use input::{check_matrix, ExperimentInput, FileMetadata, InputMode, Matrix};
pub use kpi::{Kpi, KpiValue};
pub use params::{BeeParams, BeeParamsBuilder, DEFAULT_TRIAL_LIMIT, MAX_ITERATIONS_LIMIT};
pub use run_result::{RunOutcome, RunRequest, RunResponse, RunState};
pub use series_point::{convergence, ResultSeriesPoint};
pub use view::{ExperimentView, Snapshot};
