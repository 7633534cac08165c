//! Experiment Input - the decision matrix a run optimizes over

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Decision matrix: rows are alternatives, columns are criteria.
pub type Matrix = Vec<Vec<f64>>;

/// How the user supplied the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputMode {
    /// Parsed from an uploaded CSV or spreadsheet file.
    #[serde(alias = "excel")]
    UploadedFile,
    /// One of the bundled datasets, looked up by name.
    #[serde(alias = "preloaded")]
    PreloadedDataset,
    /// Typed in by hand.
    #[serde(alias = "manual")]
    ManualMatrix,
}

/// Metadata of an uploaded source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Original file name
    pub name: String,
    /// Parsed row count
    #[serde(alias = "rows")]
    pub row_count: usize,
    /// Parsed column count
    #[serde(alias = "cols")]
    pub col_count: usize,
}

/// Input data of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentInput {
    mode: InputMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dataset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    matrix: Option<Matrix>,
    #[serde(default, alias = "fileMeta", skip_serializing_if = "Option::is_none")]
    file_metadata: Option<FileMetadata>,
}

impl ExperimentInput {
    /// Input typed in by hand.
    #[must_use]
    pub const fn manual(matrix: Matrix) -> Self {
        Self {
            mode: InputMode::ManualMatrix,
            dataset_name: None,
            matrix: Some(matrix),
            file_metadata: None,
        }
    }

    /// Input referencing a bundled dataset; the matrix is resolved later.
    #[must_use]
    pub fn preloaded(dataset_name: impl Into<String>) -> Self {
        Self {
            mode: InputMode::PreloadedDataset,
            dataset_name: Some(dataset_name.into()),
            matrix: None,
            file_metadata: None,
        }
    }

    /// Input parsed from an uploaded file.
    #[must_use]
    pub fn uploaded(file_name: impl Into<String>, matrix: Matrix) -> Self {
        let file_metadata = FileMetadata {
            name: file_name.into(),
            row_count: matrix.len(),
            col_count: matrix.first().map_or(0, Vec::len),
        };
        Self {
            mode: InputMode::UploadedFile,
            dataset_name: None,
            matrix: Some(matrix),
            file_metadata: Some(file_metadata),
        }
    }

    /// Input mode.
    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    /// Dataset name for preloaded inputs.
    #[must_use]
    pub fn dataset_name(&self) -> Option<&str> {
        self.dataset_name.as_deref()
    }

    /// The matrix, if resolved.
    #[must_use]
    pub fn matrix(&self) -> Option<&[Vec<f64>]> {
        self.matrix.as_deref()
    }

    /// Uploaded file metadata, if any.
    #[must_use]
    pub const fn file_metadata(&self) -> Option<&FileMetadata> {
        self.file_metadata.as_ref()
    }

    /// Number of criteria (matrix columns), zero when unresolved.
    #[must_use]
    pub fn criteria_count(&self) -> usize {
        self.matrix
            .as_ref()
            .and_then(|m| m.first())
            .map_or(0, Vec::len)
    }

    /// Number of alternatives (matrix rows), zero when unresolved.
    #[must_use]
    pub fn alternative_count(&self) -> usize {
        self.matrix.as_ref().map_or(0, Vec::len)
    }

    /// Copy of this input with the matrix filled in (preloaded resolution).
    #[must_use]
    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = Some(matrix);
        self
    }

    /// Check that the input names a dataset or carries a usable matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingData`] when a preloaded input has no
    /// dataset name, or when the matrix is absent, empty, or ragged.
    pub fn validate(&self) -> Result<(usize, usize), ValidationError> {
        if self.mode == InputMode::PreloadedDataset
            && self.dataset_name.as_deref().map_or(true, str::is_empty)
        {
            return Err(ValidationError::MissingData(
                "no dataset selected".to_string(),
            ));
        }
        check_matrix(self.matrix.as_deref().unwrap_or_default())
    }
}

/// Check that a matrix is non-empty and rectangular.
///
/// Returns `(rows, cols)` on success.
///
/// # Errors
///
/// Returns [`ValidationError::MissingData`] describing the first defect found.
pub fn check_matrix(matrix: &[Vec<f64>]) -> Result<(usize, usize), ValidationError> {
    let Some(first) = matrix.first() else {
        return Err(ValidationError::MissingData("matrix is empty".to_string()));
    };
    let cols = first.len();
    if cols == 0 {
        return Err(ValidationError::MissingData(
            "matrix has no columns".to_string(),
        ));
    }
    if let Some(row) = matrix.iter().position(|r| r.len() != cols) {
        return Err(ValidationError::MissingData(format!(
            "row {} has {} columns, expected {cols}",
            row + 1,
            matrix[row].len()
        )));
    }
    Ok((matrix.len(), cols))
}
