//! Error taxonomy for docgate.
//!
//! Policy and co-change violations are not errors; they are collected into an
//! [`EvaluationReport`](crate::report::EvaluationReport). `GateError` is
//! reserved for faults that must abort the run.

use std::path::PathBuf;

/// docgate errors.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {path} is not valid UTF-8")]
    ArtifactEncoding { path: PathBuf },

    #[error("invalid stage: {0} (expected research, security, pipeline or full)")]
    InvalidStage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for docgate operations.
pub type Result<T> = std::result::Result<T, GateError>;
