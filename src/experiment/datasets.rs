//! Bundled datasets for the `PreloadedDataset` input mode

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Matrix;

/// A named decision matrix shipped with the crate.
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadedDataset {
    /// Catalog key
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Row labels
    pub alternatives: Vec<String>,
    /// Column labels
    pub criteria: Vec<String>,
    /// Values, `alternatives.len()` rows by `criteria.len()` columns
    pub matrix: Matrix,
}

const TOY_9X5: [[f64; 5]; 9] = [
    [0.048, 0.047, 0.070, 0.087, 0.190],
    [0.053, 0.052, 0.066, 0.081, 0.058],
    [0.057, 0.057, 0.066, 0.076, 0.022],
    [0.062, 0.062, 0.063, 0.058, 0.007],
    [0.066, 0.066, 0.070, 0.085, 0.004],
    [0.070, 0.071, 0.066, 0.058, 0.003],
    [0.075, 0.075, 0.066, 0.047, 0.002],
    [0.079, 0.079, 0.066, 0.035, 0.002],
    [0.083, 0.083, 0.066, 0.051, 0.000],
];

/// Names of every bundled dataset, catalog order.
pub const DATASET_NAMES: [&str; 3] = ["toy-9x5", "sample-10x10", "large-20x15"];

fn labels(prefix: char, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{prefix}{i}")).collect()
}

// Generated matrices are seeded so every process sees the same values.
fn generated(seed: u64, rows: usize, cols: usize) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen::<f64>()).collect())
        .collect()
}

/// Look up a bundled dataset by name.
#[must_use]
pub fn find_dataset(name: &str) -> Option<PreloadedDataset> {
    match name {
        "toy-9x5" => Some(PreloadedDataset {
            name: "toy-9x5",
            description: "Small test case with 9 alternatives and 5 criteria",
            alternatives: labels('A', 9),
            criteria: labels('C', 5),
            matrix: TOY_9X5.iter().map(|row| row.to_vec()).collect(),
        }),
        "sample-10x10" => Some(PreloadedDataset {
            name: "sample-10x10",
            description: "Medium test case with 10 alternatives and 10 criteria",
            alternatives: labels('A', 10),
            criteria: labels('C', 10),
            matrix: generated(10, 10, 10),
        }),
        "large-20x15" => Some(PreloadedDataset {
            name: "large-20x15",
            description: "Large test case with 20 alternatives and 15 criteria",
            alternatives: labels('A', 20),
            criteria: labels('C', 15),
            matrix: generated(20, 20, 15),
        }),
        _ => None,
    }
}

/// Every bundled dataset, catalog order.
#[must_use]
pub fn preloaded_datasets() -> Vec<PreloadedDataset> {
    DATASET_NAMES.iter().filter_map(|n| find_dataset(n)).collect()
}
