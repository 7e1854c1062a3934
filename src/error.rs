//! Error types for reefscope
//!
//! This module provides structured error handling using thiserror,
//! replacing ad-hoc String-based errors with proper typed errors.

use thiserror::Error;

/// Main error type for reefscope operations
#[derive(Error, Debug)]
pub enum ReefError {
    /// File I/O error
    #[error("Failed to access file: {0}")]
    FileIo(#[from] std::io::Error),

    /// Polars data processing error
    #[error("Data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Construction-time configuration error. Fatal: the session must
    /// not come up with an invalid palette, mode or provider setup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider returned tables that do not fit together. The
    /// current reload is aborted and the previous state kept.
    #[error("Inconsistent data: {0}")]
    DataInconsistency(String),

    /// Column not found in data
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Empty dataset error
    #[error("Dataset is empty or has no rows")]
    EmptyDataset,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for reefscope operations
pub type Result<T> = std::result::Result<T, ReefError>;

impl ReefError {
    /// Get a user-friendly error message suitable for displaying in a client
    pub fn user_message(&self) -> String {
        match self {
            ReefError::FileIo(e) => format!("File error: {}", e),
            ReefError::Polars(e) => format!("Data error: {}", e),
            ReefError::Config(msg) => format!("Config error: {}", msg),
            ReefError::DataInconsistency(msg) => format!("Inconsistent data: {}", msg),
            ReefError::ColumnNotFound { column } => {
                format!("Column '{}' not found", column)
            }
            ReefError::EmptyDataset => "Dataset is empty".to_string(),
            ReefError::Json(e) => format!("JSON error: {}", e),
        }
    }

    /// True if the error aborts an in-flight reload but keeps the session
    /// alive in its last known-good state.
    pub fn aborts_reload(&self) -> bool {
        !matches!(self, ReefError::Config(_))
    }
}
