//! Execution context error types

use shared::SharedError;
use thiserror::Error;

/// Result type for workload operations
pub type WorkloadResult<T> = Result<T, WorkloadError>;

/// Workload error types
#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("Invalid resource URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl WorkloadError {
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        WorkloadError::FetchFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        WorkloadError::ProtocolError {
            message: message.into(),
        }
    }
}
