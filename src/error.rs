//! Error types for the modal pipeline

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Stage;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Inconsistent result data: {0}")]
    InconsistentResultData(String),

    #[error("Required file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Solver job '{job}' exited with status {status}")]
    SolverFailed { job: String, status: String },

    #[error("Failed to launch solver: {0}")]
    SolverLaunch(String),

    #[error("Solver job '{job}' did not produce {file}")]
    MissingOutput { job: String, file: PathBuf },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pipeline is at stage {actual:?}, expected {expected:?}")]
    StageOrder { expected: Stage, actual: Stage },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn inconsistent(msg: impl Into<String>) -> Self {
        Self::InconsistentResultData(msg.into())
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
