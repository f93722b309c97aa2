//! Typed errors for data loading, model inference and ranking
//!
//! Loader and startup code wraps these in `anyhow` with context; the HTTP
//! layer maps them onto status codes (see `api_server::AppError`).

use std::path::PathBuf;
use thiserror::Error;

/// Reference table could not be loaded
#[derive(Debug, Error)]
pub enum DataError {
    /// File absent: surfaced to the user as "please upload", never fatal
    #[error("data file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("column '{column}' missing or of the wrong type in {table}")]
    Column { table: &'static str, column: String },

    #[error("{table} contains no usable rows")]
    Empty { table: &'static str },

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

/// Classifier fitting / inference failures
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("{features} feature rows but {labels} labels")]
    LabelCountMismatch { features: usize, labels: usize },

    #[error("expected {expected} features, got {actual}")]
    FeatureDimension { expected: usize, actual: usize },

    #[error("unknown {kind} '{value}'")]
    UnknownCategory { kind: &'static str, value: String },

    #[error("{labels} class labels but {probabilities} probabilities")]
    ProbabilityMismatch { labels: usize, probabilities: usize },

    #[error("probability for '{label}' is not within [0, 1]: {value}")]
    InvalidProbability { label: String, value: f64 },

    #[error("reading '{field}' must be a finite number >= 0, got {value}")]
    InvalidReading { field: &'static str, value: f64 },
}

/// Ranking outcome that is not a success list
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecommendError {
    /// Classifier ran, but none of its labels are grown in the district
    #[error("no predicted crop is grown in the selected district")]
    NoLocalMatch,
}
