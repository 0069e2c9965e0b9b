//! Error handling module
//!
//! Provides the error taxonomy for a single dataset's ingestion pipeline.
//! Every variant maps to a stable error code so operator-facing messages
//! always carry both the dataset name and the kind of failure.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline-wide error type
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read source {path}: {message}")]
    SourceRead { path: PathBuf, message: String },

    #[error("Malformed input in {path}: {message}")]
    MalformedInput { path: PathBuf, message: String },

    #[error("Schema cache error for {path}: {message}")]
    CacheIo { path: PathBuf, message: String },

    #[error("Report error: {0}")]
    Report(String),

    #[error("Emission failed: {0}")]
    Emission(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),
}

impl IngestError {
    /// Stable code used in log lines and run summaries
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::SourceRead { .. } => "SOURCE_READ",
            IngestError::MalformedInput { .. } => "MALFORMED_INPUT",
            IngestError::CacheIo { .. } => "CACHE_IO",
            IngestError::Report(_) => "REPORT",
            IngestError::Emission(_) => "EMISSION",
            IngestError::Timeout(_) => "TIMEOUT",
        }
    }
}

/// Result type alias for pipeline stages
pub type IngestResult<T> = Result<T, IngestError>;

/// Helper function to create a source read error
pub fn source_error(path: impl Into<PathBuf>, msg: impl ToString) -> IngestError {
    IngestError::SourceRead {
        path: path.into(),
        message: msg.to_string(),
    }
}

/// Helper function to create a malformed input error
pub fn malformed_error(path: impl Into<PathBuf>, msg: impl ToString) -> IngestError {
    IngestError::MalformedInput {
        path: path.into(),
        message: msg.to_string(),
    }
}

/// Helper function to create a cache error
pub fn cache_error(path: impl Into<PathBuf>, msg: impl ToString) -> IngestError {
    IngestError::CacheIo {
        path: path.into(),
        message: msg.to_string(),
    }
}
