//! Spreadsheet rendering (`.xlsx`)
//!
//! The workbook is first laid out as plain [`Sheet`] values, then encoded
//! with `rust_xlsxwriter`. The layout is what tests inspect; the encoder only
//! turns it into bytes.
//!
//! Sheets, in order:
//! - **Summary**: experiment fields, then the KPI list
//! - **Results**: the first [`SPREADSHEET_RESULT_LIMIT`] series points
//! - **Metadata**: a glossary of the columns above

use chrono::{Datelike, Timelike};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, XlsxError};

use super::{summary_fields, SPREADSHEET_RESULT_LIMIT};
use crate::experiment::{Experiment, KpiValue};
use crate::{Error, Result};

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text cell
    Text(String),
    /// Numeric cell
    Number(f64),
    /// Bold header cell
    Header(&'static str),
    /// Nothing written
    Empty,
}

impl From<&KpiValue> for Cell {
    fn from(value: &KpiValue) -> Self {
        match value {
            KpiValue::Number(n) => Self::Number(*n),
            KpiValue::Text(s) => Self::Text(s.clone()),
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::Number)
    }
}

/// A named sheet of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Tab name
    pub name: &'static str,
    /// Rows, top to bottom
    pub rows: Vec<Vec<Cell>>,
    /// Column widths in characters
    pub widths: &'static [f64],
}

const GLOSSARY: [(&str, &str, &str); 8] = [
    ("Field / Value", "Summary", "Experiment parameters and input description"),
    ("Key Performance Indicators", "Summary", "Headline values of the run, in display order"),
    ("Iteration", "Results", "1-based iteration number"),
    ("Best Fitness", "Results", "Best objective value found so far"),
    ("Avg Fitness", "Results", "Mean objective value of the colony"),
    ("Std Fitness", "Results", "Standard deviation of the colony's objective values"),
    ("Population Size", "Summary", "Number of bees in the colony"),
    ("Trial Limit", "Summary", "Unimproved visits before a food source is abandoned"),
];

/// Lay out the workbook.
#[must_use]
pub fn workbook_model(experiment: &Experiment) -> Vec<Sheet> {
    let mut summary = vec![vec![Cell::Header("Field"), Cell::Header("Value")]];
    summary.extend(
        summary_fields(experiment)
            .into_iter()
            .map(|(field, value)| vec![Cell::Text(field.to_string()), Cell::Text(value)]),
    );
    summary.push(Vec::new());
    summary.push(vec![Cell::Header("Key Performance Indicators")]);
    summary.extend(
        experiment
            .kpis()
            .iter()
            .map(|kpi| vec![Cell::Text(kpi.label().to_string()), Cell::from(kpi.value())]),
    );

    let mut results = vec![vec![
        Cell::Header("Iteration"),
        Cell::Header("Best Fitness"),
        Cell::Header("Avg Fitness"),
        Cell::Header("Std Fitness"),
    ]];
    results.extend(
        experiment
            .result_series()
            .iter()
            .take(SPREADSHEET_RESULT_LIMIT)
            .map(|p| {
                vec![
                    Cell::Number(f64::from(p.iteration())),
                    Cell::Number(p.best_fitness()),
                    Cell::from(p.avg_fitness()),
                    Cell::from(p.std_fitness()),
                ]
            }),
    );

    let mut metadata = vec![vec![
        Cell::Header("Column"),
        Cell::Header("Sheet"),
        Cell::Header("Description"),
    ]];
    metadata.extend(GLOSSARY.iter().map(|(column, sheet, description)| {
        vec![
            Cell::Text((*column).to_string()),
            Cell::Text((*sheet).to_string()),
            Cell::Text((*description).to_string()),
        ]
    }));

    vec![
        Sheet {
            name: "Summary",
            rows: summary,
            widths: &[28.0, 40.0],
        },
        Sheet {
            name: "Results",
            rows: results,
            widths: &[12.0, 16.0, 16.0, 16.0],
        },
        Sheet {
            name: "Metadata",
            rows: metadata,
            widths: &[28.0, 12.0, 56.0],
        },
    ]
}

/// Encode the workbook.
///
/// The document creation time is `created_at`, so equal experiments yield
/// equal workbooks.
///
/// # Errors
///
/// Returns [`Error::RenderFailed`] if the encoder rejects the content.
pub fn render(experiment: &Experiment) -> Result<Vec<u8>> {
    encode(experiment).map_err(|e| Error::RenderFailed(format!("spreadsheet: {e}")))
}

fn encode(experiment: &Experiment) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let created = experiment.created_at();
    let year = u16::try_from(created.year()).unwrap_or(1970);
    #[allow(clippy::cast_possible_truncation)]
    let stamp = ExcelDateTime::from_ymd(year, created.month() as u8, created.day() as u8)?
        .and_hms(created.hour() as u16, created.minute() as u8, created.second())?;
    let properties = DocProperties::new()
        .set_title(experiment.name())
        .set_subject("Bee colony optimization experiment")
        .set_creation_datetime(&stamp);
    workbook.set_properties(&properties);

    for sheet in workbook_model(experiment) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;
        for (col, width) in (0u16..).zip(sheet.widths) {
            worksheet.set_column_width(col, *width)?;
        }
        for (row, cells) in (0u32..).zip(&sheet.rows) {
            for (col, cell) in (0u16..).zip(cells) {
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row, col, text)?;
                    }
                    Cell::Number(n) if n.is_finite() => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_string(row, col, n.to_string())?;
                    }
                    Cell::Header(text) => {
                        worksheet.write_string_with_format(row, col, *text, &bold)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }

    workbook.save_to_buffer()
}
