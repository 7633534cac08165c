//! Export pipeline: one experiment, several byte-exact renderings
//!
//! Every renderer is a pure function of the [`Experiment`]: timestamps come
//! from `created_at`, never from the clock, so rendering the same experiment
//! twice yields the same content.
//!
//! | Format        | Accepted names          | Extension | Content                         |
//! |---------------|-------------------------|-----------|---------------------------------|
//! | `Spreadsheet` | `spreadsheet`, `xlsx`   | `xlsx`    | Summary / Results (≤50) / Metadata |
//! | `Document`    | `document`, `pdf`       | `pdf`     | header, summary, KPIs, ≤20 rows |
//! | `Csv`         | `csv`                   | `csv`     | summary, KPIs, full series      |
//!
//! # Example
//!
//! ```rust,no_run
//! use beelab::export::{export_named, file_name, ExportFormat};
//! # fn example(experiment: &beelab::experiment::Experiment) -> beelab::Result<()> {
//! let bytes = export_named(experiment, "spreadsheet")?;
//! assert_eq!(file_name(experiment, ExportFormat::Spreadsheet), format!("experiment-{}.xlsx", experiment.id()));
//! # Ok(())
//! # }
//! ```

pub mod csv;
pub mod document;
pub mod spreadsheet;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::experiment::{Experiment, InputMode};
use crate::{Error, Result};

/// Result rows written to the spreadsheet's Results sheet.
pub const SPREADSHEET_RESULT_LIMIT: usize = 50;

/// Result rows written to the document.
pub const DOCUMENT_RESULT_LIMIT: usize = 20;

/// Output representation of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Office Open XML workbook
    Spreadsheet,
    /// PDF document
    Document,
    /// Comma-separated text
    Csv,
}

impl ExportFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Spreadsheet => "xlsx",
            Self::Document => "pdf",
            Self::Csv => "csv",
        }
    }

    /// MIME type of the rendered bytes.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Spreadsheet => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Document => "application/pdf",
            Self::Csv => "text/csv",
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spreadsheet => "spreadsheet",
            Self::Document => "document",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spreadsheet" | "xlsx" => Ok(Self::Spreadsheet),
            "document" | "pdf" => Ok(Self::Document),
            "csv" => Ok(Self::Csv),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Render an experiment.
///
/// # Errors
///
/// Returns [`Error::RenderFailed`] if the spreadsheet encoder fails.
pub fn export(experiment: &Experiment, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Spreadsheet => spreadsheet::render(experiment),
        ExportFormat::Document => Ok(document::render(experiment)),
        ExportFormat::Csv => Ok(csv::render(experiment).into_bytes()),
    }
}

/// Parse `format` and render; unknown names produce no bytes.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for an unknown name, otherwise as
/// [`export`].
pub fn export_named(experiment: &Experiment, format: &str) -> Result<Vec<u8>> {
    export(experiment, format.parse()?)
}

/// Download name: `experiment-{id}.{ext}`.
#[must_use]
pub fn file_name(experiment: &Experiment, format: ExportFormat) -> String {
    format!("experiment-{}.{}", experiment.id(), format.extension())
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) const fn mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::UploadedFile => "Uploaded file",
        InputMode::PreloadedDataset => "Preloaded dataset",
        InputMode::ManualMatrix => "Manual matrix",
    }
}

pub(crate) fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

/// Summary rows shared by the spreadsheet and document renderers.
pub(crate) fn summary_fields(experiment: &Experiment) -> Vec<(&'static str, String)> {
    let params = experiment.params();
    let input = experiment.input();
    vec![
        ("Name", experiment.name().to_string()),
        ("ID", experiment.id().to_string()),
        ("Created", timestamp(experiment.created_at())),
        ("Duration (ms)", experiment.duration_ms().to_string()),
        ("Population Size", params.population_size().to_string()),
        ("Max Iterations", params.max_iterations().to_string()),
        ("Trial Limit", optional(params.trial_limit())),
        ("Random Seed", optional(params.random_seed())),
        ("Lower Bound", optional(params.lower_bound())),
        ("Upper Bound", optional(params.upper_bound())),
        ("Objective Function", optional(params.objective_function_name())),
        ("Input Mode", mode_label(input.mode()).to_string()),
        ("Dataset", optional(input.dataset_name())),
        (
            "Matrix",
            format!(
                "{} alternatives x {} criteria",
                input.alternative_count(),
                input.criteria_count()
            ),
        ),
    ]
}
