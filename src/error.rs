//! Error types for the Remyx client

use thiserror::Error;

use crate::myxboard::EvaluationTask;

/// Client Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Client Error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported models: {}", .0.join(", "))]
    UnsupportedModels(Vec<String>),

    #[error("A MyxBoard needs at least one model")]
    EmptyBoard,

    #[error("Unknown evaluation task: {0}")]
    UnknownTask(String),

    #[error("Task {task} already has job {job_name} in flight")]
    JobInFlight {
        task: EvaluationTask,
        job_name: String,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a success status but the body could not be decoded.
    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("MyxBoard not found: {0}")]
    BoardNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background worker failed: {0}")]
    Worker(String),
}

impl Error {
    /// True for failures that came from talking to the remote service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Status { .. } | Error::Http(_) | Error::InvalidResponse { .. }
        )
    }

    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Error::InvalidResponse { .. })
    }
}
