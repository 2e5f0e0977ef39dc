//! Error types for datakit
//!
//! Every failure maps to one of three kinds the CLIs report: something was
//! not found, an input failed validation, or a download ran out of retries.
//! Library errors from Arrow, Parquet, serde and reqwest convert in via `?`.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// datakit error types
#[derive(Error, Debug)]
pub enum Error {
    /// Missing input file or unresolvable remote repository
    #[error("Not found: {0}")]
    NotFound(String),

    /// Empty content, unsupported format, invalid option value
    #[error("Validation error: {0}")]
    Validation(String),

    /// Every download attempt failed
    #[error("Exceeded maximum retries for {repo_id} after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Repository that could not be fetched
        repo_id: String,
        /// Number of attempts made
        attempts: u32,
        /// Error from the last attempt
        #[source]
        source: Box<Error>,
    },

    /// Dataset decode/encode failure that is not an Arrow or Parquet error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Shorthand for [`Error::Validation`]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for [`Error::NotFound`]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
