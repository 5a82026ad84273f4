//! Orchestrator-specific error types

use shared::{ContextId, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Failed to launch execution context {context_id}: {reason}")]
    ContextLaunchFailed { context_id: ContextId, reason: String },

    #[error("Command delivery to {context_id} failed: {reason}")]
    CommandDeliveryFailed { context_id: ContextId, reason: String },

    #[error("Unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },

    #[error("Catalog error at {path}: {message}")]
    CatalogError { path: String, message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>) -> Self {
        OrchestratorError::ConfigurationError { field: field.into() }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
