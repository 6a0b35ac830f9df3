//! Error types for CLI operations

use crate::checkpoint::CheckpointError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur during CLI command execution
#[derive(Error, Debug)]
pub enum CliError {
    /// Checkpoint operation error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Error executing a command or operation
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Error from adapter implementation
    #[error("Adapter error: {0}")]
    AdapterError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// Invalid argument or input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Message suitable for showing to the user
    pub fn user_friendly_message(&self) -> String {
        match self {
            CliError::Checkpoint(e) => e.user_friendly_message(),
            other => other.to_string(),
        }
    }
}

// Conversions from common error types
impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::SerdeError(err.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::ExecutionError(err.to_string())
    }
}
