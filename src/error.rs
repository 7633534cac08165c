//! Error types for beelab
//!
//! Every failure crossing a store, network or render boundary is translated
//! into one of these kinds before it reaches the caller.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Input step the user must return to after a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputStep {
    /// Data selection (upload, preloaded dataset or manual matrix)
    Data,
    /// Algorithm parameters
    Params,
    /// Experiment name
    Name,
}

/// A user-correctable problem with a run request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The experiment name is empty or whitespace.
    #[error("Please enter an experiment name")]
    MissingName,

    /// The resolved matrix is empty or not rectangular.
    #[error("Please provide data for the experiment: {0}")]
    MissingData(String),

    /// A preloaded dataset name that the catalog does not know.
    #[error("Unknown preloaded dataset: {0}")]
    UnknownDataset(String),

    /// Parameters outside their accepted ranges.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl ValidationError {
    /// The input step the caller should navigate back to.
    #[must_use]
    pub const fn step(&self) -> InputStep {
        match self {
            Self::MissingName => InputStep::Name,
            Self::MissingData(_) | Self::UnknownDataset(_) => InputStep::Data,
            Self::InvalidParams(_) => InputStep::Params,
        }
    }
}

/// beelab error types
#[derive(Error, Debug)]
pub enum Error {
    /// The run request itself is unsatisfiable until the user corrects it
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The remote service could not be reached (connect failure, timeout, bad body)
    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote service answered with a non-success status
    #[error("Remote service rejected the request with status {status}: {body}")]
    RemoteRejected {
        /// HTTP status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// A store write or read could not complete
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// No experiment with the given id
    #[error("Experiment not found: {0}")]
    NotFound(String),

    /// Export format outside the supported set
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// A renderer failed to encode its output
    #[error("Export rendering failed: {0}")]
    RenderFailed(String),

    /// The run was abandoned before persisting began
    #[error("Run cancelled before persisting")]
    Cancelled,

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the failure kinds that trigger the local fallback.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_) | Self::RemoteRejected { .. })
    }

    /// The validation payload, if this is a validation failure.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_steps() {
        assert_eq!(ValidationError::MissingName.step(), InputStep::Name);
        assert_eq!(
            ValidationError::MissingData("empty".into()).step(),
            InputStep::Data
        );
        assert_eq!(
            ValidationError::UnknownDataset("x".into()).step(),
            InputStep::Data
        );
        assert_eq!(
            ValidationError::InvalidParams("x".into()).step(),
            InputStep::Params
        );
    }

    #[test]
    fn test_remote_classification() {
        assert!(Error::RemoteUnavailable("timeout".into()).is_remote());
        assert!(Error::RemoteRejected {
            status: 500,
            body: String::new()
        }
        .is_remote());
        assert!(!Error::NotFound("x".into()).is_remote());
    }
}
