//! # Beelab: Experiment Lifecycle Manager for Bee-Colony Optimization
//!
//! **Version**: 0.1.0
//!
//! Beelab takes a parameterized optimization request, obtains results from an
//! external optimization service (or a local simulator when that service is
//! unavailable), persists the resulting experiment to a local cache and a
//! canonical remote store, keeps the two consistent at session start, and
//! renders experiments as spreadsheet, document or CSV files.
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────┐  POST /run   ┌──────────────────────┐
//!  RunSubmission │ Orchestrator ├─────────────>│ optimization service │
//!  ─────────────>│              │<── fallback ─┤ LocalSimulator       │
//!                └──┬────────┬──┘              └──────────────────────┘
//!            put    │        │ put (best-effort)
//!                   v        v
//!          LocalStore      HttpExperimentStore ──> beelab-server
//!         (FileKvStore)         (canonical)
//!                   \        /
//!                  reconcile() ──> ExperimentView ──> export()
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use beelab::config::LabConfig;
//! use beelab::experiment::{BeeParams, ExperimentInput, ExperimentView};
//! use beelab::export::ExportFormat;
//! use beelab::orchestrator::{DefaultOrchestrator, RunSubmission};
//!
//! # async fn example() -> beelab::Result<()> {
//! let config = LabConfig::from_env()?;
//! let view = Arc::new(ExperimentView::new());
//! let orchestrator = DefaultOrchestrator::from_config(&config, Arc::clone(&view)).await?;
//!
//! // Local cache first, then the canonical store
//! orchestrator.hydrate().await;
//!
//! let report = orchestrator
//!     .run(RunSubmission::new(
//!         "toy run",
//!         BeeParams::new(20, 50),
//!         ExperimentInput::preloaded("toy-9x5"),
//!     ))
//!     .await?;
//!
//! let xlsx = beelab::export::export(&report.experiment, ExportFormat::Spreadsheet)?;
//! println!("{} bytes, fallback: {}", xlsx.len(), report.is_fallback());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod experiment;
pub mod export;
pub mod kv;
pub mod orchestrator;
pub mod reconcile;
pub mod remote;
pub mod server;
pub mod simulator;
pub mod store;

pub use error::{Error, Result};
