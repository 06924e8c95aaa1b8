//! Error types for apt-index

use thiserror::Error;

/// Errors that can occur while refreshing or reading APT package indexes
#[derive(Error, Debug)]
pub enum AptError {
    /// Source line could not be parsed
    #[error("Invalid APT source line: {0}")]
    InvalidSource(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Mirror answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Compressed index could not be inflated
    #[error("Failed to decompress {url}: {reason}")]
    Decompress { url: String, reason: String },

    /// None of the candidate index files for a source could be fetched
    #[error("No package index available for source: {0}")]
    NoIndex(String),
}

impl From<reqwest::Error> for AptError {
    fn from(err: reqwest::Error) -> Self {
        AptError::Http(err.to_string())
    }
}
