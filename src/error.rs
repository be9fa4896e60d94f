//! Error types for trueno-speedmap
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trueno-speedmap error types
#[derive(Error, Debug)]
pub enum Error {
    /// Experiment log exists but cannot be used (wrong column count, non-numeric content)
    #[error("Malformed log {path}: {reason}\nThe experiment is skipped; other cells are unaffected")]
    MalformedLog {
        /// Path (or in-memory label) of the offending log
        path: String,
        /// What was wrong with it
        reason: String,
    },

    /// Configuration tables are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every architecture lacks data for a dataset, so the column has no minimum
    #[error("No data for dataset '{dataset}': no architecture produced a usable experiment\nCheck that the log directory contains {dataset}_<experiment>.csv files")]
    DegenerateColumn {
        /// Dataset whose column could not be normalized
        dataset: String,
    },

    /// A summary needed a cell that has no data
    #[error("Architecture '{architecture}' has no data for dataset '{dataset}'")]
    IncompleteRow {
        /// Architecture row being summarized
        architecture: String,
        /// Dataset column lacking data
        dataset: String,
    },

    /// Architecture name not present in the configuration
    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),

    /// Invalid argument to an algorithm
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Heatmap drawing failed
    #[error("Render error: {0}")]
    Render(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
