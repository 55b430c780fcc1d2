//! Error types for recondiff operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecondiffError>;

#[derive(Error, Debug)]
pub enum RecondiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Connectivity error: {message}")]
    Connectivity { message: String },

    #[error("Not found: {name}")]
    NotFound { name: String },

    #[error("Report error: {message}")]
    Report { message: String },

    #[error("Comparison failed: {message}")]
    ComparisonFailed { message: String },

    #[error("{failed} of {total} comparison jobs failed")]
    JobsFailed { failed: usize, total: usize },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl RecondiffError {
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: msg.into(),
        }
    }

    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity {
            message: msg.into(),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report {
            message: msg.into(),
        }
    }

    pub fn comparison_failed(msg: impl Into<String>) -> Self {
        Self::ComparisonFailed {
            message: msg.into(),
        }
    }

    /// Whether this failure is an expected collaborator failure that is
    /// absorbed into a FAILED job result instead of propagating.
    pub fn is_job_recoverable(&self) -> bool {
        matches!(self, Self::Connectivity { .. } | Self::NotFound { .. })
    }
}
