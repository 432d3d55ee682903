//! Error types for the essence library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for essence operations.
#[derive(Debug, Error)]
pub enum EssenceError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no rows to convert.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Fatal configuration problem: malformed rule set, uncompilable pattern
    /// or a rule set that could not be persisted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rule or dictionary mutation that cannot be applied.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// A cell that could not be mapped onto its record field.
    #[error("Cannot map {field}: {message}")]
    Mapping { field: String, message: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl EssenceError {
    /// Build a mapping error for a record field.
    pub fn mapping(field: impl Into<String>, message: impl Into<String>) -> Self {
        EssenceError::Mapping {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors that must abort a run instead of being
    /// downgraded to a per-row issue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EssenceError::Config(_) | EssenceError::Io { .. })
    }
}

/// Result type alias for essence operations.
pub type Result<T> = std::result::Result<T, EssenceError>;
