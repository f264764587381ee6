//! Error types for the tuner core.
//!
//! Estimation, smoothing and note mapping never fail; they report "no data"
//! as `None`. Errors only arise at the edges: invalid configuration and
//! hand-off to the analysis worker.

use thiserror::Error;

/// Errors that can occur while setting up or feeding the tuner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TunerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start analysis worker: {0}")]
    WorkerSpawn(String),

    #[error("Analysis worker has shut down")]
    WorkerDisconnected,
}

/// Result type for tuner operations.
pub type Result<T> = std::result::Result<T, TunerError>;
