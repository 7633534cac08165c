//! KPI - labelled headline values of a run

use std::fmt;

use serde::{Deserialize, Serialize};

/// KPI value: numeric or textual.
///
/// Serialized untagged, so the wire form is a bare JSON number or string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KpiValue {
    /// Numeric value
    Number(f64),
    /// Textual value (dataset names, "n/a", ...)
    Text(String),
}

impl KpiValue {
    /// Numeric value, if this is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for KpiValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for KpiValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for KpiValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KpiValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A labelled KPI. Order within an experiment is display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Kpi {
    label: String,
    value: KpiValue,
}

impl Kpi {
    /// Create a KPI.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<KpiValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Value.
    #[must_use]
    pub const fn value(&self) -> &KpiValue {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_untagged_wire() {
        let kpis = vec![Kpi::new("Iterations", 50u32), Kpi::new("Dataset", "toy-9x5")];
        let json = serde_json::to_string(&kpis).unwrap();
        assert_eq!(
            json,
            r#"[{"label":"Iterations","value":50.0},{"label":"Dataset","value":"toy-9x5"}]"#
        );

        let back: Vec<Kpi> = serde_json::from_str(r#"[{"label":"a","value":3},{"label":"b","value":"x"}]"#).unwrap();
        assert_eq!(back[0].value().as_number(), Some(3.0));
        assert_eq!(back[1].value(), &KpiValue::Text("x".to_string()));
    }

    #[test]
    fn test_kpi_display() {
        assert_eq!(KpiValue::Number(1.5).to_string(), "1.5");
        assert_eq!(KpiValue::Number(50.0).to_string(), "50");
        assert_eq!(KpiValue::from("n/a").to_string(), "n/a");
    }
}
