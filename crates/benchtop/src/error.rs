//! Error types for the Benchtop library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Benchtop operations.
#[derive(Debug, Error)]
pub enum BenchtopError {
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

    /// Input bytes could not be parsed into a table.
    #[error("Format error: {0}")]
    Format(String),

    /// Input contained no rows or no columns.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A fitted pipeline was applied to a table with an incompatible schema.
    #[error("Schema mismatch: {detail} (missing columns: {missing:?})")]
    SchemaMismatch {
        missing: Vec<String>,
        detail: String,
    },

    /// Two inputs that must have equal length did not.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model fitting failed.
    #[error("Fit error: {0}")]
    Fit(String),

    /// Error saving or loading an artifact.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchtopError {
    /// Build a schema mismatch for a set of absent columns.
    pub fn missing_columns(missing: Vec<String>) -> Self {
        BenchtopError::SchemaMismatch {
            detail: format!("{} expected column(s) absent", missing.len()),
            missing,
        }
    }

    /// Build a shape mismatch between two lengths.
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        BenchtopError::ShapeMismatch {
            expected: format!("length {}", expected),
            actual: format!("length {}", actual),
        }
    }
}

/// Result type alias for Benchtop operations.
pub type Result<T> = std::result::Result<T, BenchtopError>;
