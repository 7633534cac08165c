//! CSV rendering: summary block, KPI block, then the full series.

use std::fmt::Write as _;

use super::{optional, timestamp};
use crate::experiment::Experiment;

/// Render `experiment` as CSV text.
///
/// Unlike the spreadsheet and document renderings, the series is written in
/// full.
#[must_use]
pub fn render(experiment: &Experiment) -> String {
    let params = experiment.params();
    let mut out = String::new();

    out.push_str("Experiment Results\n");
    line(&mut out, "Name", experiment.name());
    line(&mut out, "Created", &timestamp(experiment.created_at()));
    line(&mut out, "Duration (ms)", &experiment.duration_ms().to_string());
    line(&mut out, "Iterations", &params.max_iterations().to_string());
    line(&mut out, "Bees", &params.population_size().to_string());
    line(&mut out, "Feed Limit", &optional(params.trial_limit()));
    out.push('\n');

    out.push_str("Key Performance Indicators\n");
    for kpi in experiment.kpis() {
        line(&mut out, kpi.label(), &kpi.value().to_string());
    }
    out.push('\n');

    out.push_str("Iteration,Best Fitness,Avg Fitness,Std Fitness\n");
    for point in experiment.result_series() {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            point.iteration(),
            point.best_fitness(),
            point.avg_fitness().map(|v| v.to_string()).unwrap_or_default(),
            point.std_fitness().map(|v| v.to_string()).unwrap_or_default(),
        );
    }
    out
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{},{}", field(label), field(value));
}

/// Quote a field when it holds a delimiter, a quote or a line break.
fn field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
