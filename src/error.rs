//! Error types for irisflow
//!
//! Startup failures (no runs, unreadable artifact) are fatal at the binary
//! boundary; request-time failures are recoverable per-request.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Irisflow error types
#[derive(Error, Debug)]
pub enum Error {
    /// Selection found no runs for the experiment
    #[error("no runs found for experiment '{experiment}'")]
    NoRunsFound {
        /// Experiment name that was queried
        experiment: String,
    },

    /// Artifact could not be read or deserialized
    #[error("artifact load failed: {0}")]
    ArtifactLoad(String),

    /// Client sent an empty or malformed feature payload
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Model rejected the input at prediction time
    #[error("inference failed: {0}")]
    Inference(String),

    /// One training trial failed to fit (caught inside a sweep)
    #[error("trial failed: {0}")]
    Trial(String),

    /// Dataset could not be parsed or is unusable for training
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Run store backend error
    #[error("run store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
