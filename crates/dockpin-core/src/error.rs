//! Error taxonomy for dockpin rewrites.

use apt_index::AptError;

/// Errors produced by the rewriting and pinning engine.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("{instruction} not found")]
    NotFound { instruction: String },

    #[error("expected at least {expected} replacement images, got {actual}")]
    ArgumentMismatch { expected: usize, actual: usize },

    #[error("package repository refresh failed: {0}")]
    RepositoryRefreshFailed(#[source] AptError),

    #[error("parse inconsistency: {0}")]
    ParseInconsistency(String),

    #[error("invalid diff report: {0}")]
    InvalidDiffReport(#[from] serde_json::Error),
}

impl PinError {
    pub(crate) fn not_found(instruction: &str) -> Self {
        PinError::NotFound {
            instruction: instruction.to_string(),
        }
    }
}

/// Result type for dockpin operations.
pub type Result<T> = std::result::Result<T, PinError>;
