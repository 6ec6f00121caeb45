//! Error types for the gridbench core library.
//!
//! Registry and argument errors are returned to the caller. Everything that can
//! go wrong inside a single (problem, algorithm) cell is folded into a
//! [`CellError`] and recorded in the batch report instead.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level error type for the gridbench core library.
#[derive(Debug, thiserror::Error)]
pub enum GridbenchError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from component registration and lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{kind} already registered: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Invalid {kind} name: {name:?}")]
    InvalidName { kind: &'static str, name: String },
}

/// Errors from the data-loading collaborator.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Dataset not found for problem '{problem}': {path}")]
    NotFound { problem: String, path: PathBuf },

    #[error("Malformed dataset for problem '{problem}': {reason}")]
    Malformed { problem: String, reason: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn malformed(problem: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            problem: problem.into(),
            reason: reason.into(),
        }
    }

    /// The cell failure cause this load error is reported as.
    pub fn cause(&self) -> FailureCause {
        match self {
            Self::NotFound { .. } => FailureCause::DatasetNotFound,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                FailureCause::DatasetNotFound
            }
            Self::Malformed { .. } | Self::Io { .. } => FailureCause::MalformedDataset,
        }
    }
}

/// Errors raised by algorithm implementations during fit, predict or transform.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgorithmError {
    #[error("unsupported data: {0}")]
    Unsupported(String),

    #[error("ill-conditioned input: {0}")]
    IllConditioned(String),

    #[error("component used before fit")]
    NotFitted,

    #[error("{0}")]
    Other(String),
}

impl AlgorithmError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn ill_conditioned(msg: impl Into<String>) -> Self {
        Self::IllConditioned(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Why a single batch cell failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    UnknownAlgorithm,
    BuildFailed,
    EvaluationFailed,
    DatasetNotFound,
    MalformedDataset,
    Timeout,
    Panicked,
}

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownAlgorithm => "unknown_algorithm",
            Self::BuildFailed => "build_failed",
            Self::EvaluationFailed => "evaluation_failed",
            Self::DatasetNotFound => "dataset_not_found",
            Self::MalformedDataset => "malformed_dataset",
            Self::Timeout => "timeout",
            Self::Panicked => "panicked",
        }
    }
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contained failure of one (problem, algorithm) cell.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{cause}: {message}")]
pub struct CellError {
    pub cause: FailureCause,
    pub message: String,
}

impl CellError {
    pub fn new(cause: FailureCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    pub fn build_failed(err: &AlgorithmError) -> Self {
        Self::new(FailureCause::BuildFailed, err.to_string())
    }

    pub fn evaluation_failed(msg: impl Into<String>) -> Self {
        Self::new(FailureCause::EvaluationFailed, msg)
    }
}

impl From<&LoadError> for CellError {
    fn from(err: &LoadError) -> Self {
        Self::new(err.cause(), err.to_string())
    }
}

/// Errors that abort a whole batch run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("No problems given")]
    EmptyProblems,

    #[error("No algorithms given")]
    EmptyAlgorithms,

    #[error("Report assembly failed: {0}")]
    Assembly(String),
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {0}")]
    Parse(#[from] Box<figment::Error>),
}

/// Result type alias for gridbench operations.
pub type Result<T> = std::result::Result<T, GridbenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::DuplicateName {
            kind: "classifier",
            name: "dtw-1nn".into(),
        };
        assert_eq!(err.to_string(), "classifier already registered: dtw-1nn");
    }

    #[test]
    fn test_load_error_cause() {
        let missing = LoadError::NotFound {
            problem: "GunPoint".into(),
            path: PathBuf::from("/data/GunPoint"),
        };
        assert_eq!(missing.cause(), FailureCause::DatasetNotFound);

        let malformed = LoadError::malformed("GunPoint", "row 3 has 2 columns");
        assert_eq!(malformed.cause(), FailureCause::MalformedDataset);

        let io_missing = LoadError::Io {
            path: PathBuf::from("x"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(io_missing.cause(), FailureCause::DatasetNotFound);

        let io_denied = LoadError::Io {
            path: PathBuf::from("x"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(io_denied.cause(), FailureCause::MalformedDataset);
    }

    #[test]
    fn test_cell_error_from_algorithm_error() {
        let err = CellError::build_failed(&AlgorithmError::ill_conditioned("singular matrix"));
        assert_eq!(err.cause, FailureCause::BuildFailed);
        assert_eq!(err.message, "ill-conditioned input: singular matrix");
        assert_eq!(
            err.to_string(),
            "build_failed: ill-conditioned input: singular matrix"
        );
    }

    #[test]
    fn test_failure_cause_serde_matches_display() {
        for cause in [
            FailureCause::UnknownAlgorithm,
            FailureCause::BuildFailed,
            FailureCause::EvaluationFailed,
            FailureCause::DatasetNotFound,
            FailureCause::MalformedDataset,
            FailureCause::Timeout,
            FailureCause::Panicked,
        ] {
            let json = serde_json::to_string(&cause).unwrap();
            assert_eq!(json, format!("\"{}\"", cause));
        }
    }
}
