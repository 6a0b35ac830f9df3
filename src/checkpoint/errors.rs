//! Error types for the checkpoint system

use super::backend::BackendError;
use super::guard::DisabledReason;
use super::models::CheckpointId;
use thiserror::Error;

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Which worker operation an error relates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Store,
    Restore,
    Query,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::Store => "store",
            OperationKind::Restore => "restore",
            OperationKind::Query => "query",
        };
        f.write_str(name)
    }
}

/// Coarse classification used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Checkpointing is permanently off for this manager
    Disabled,
    /// The referenced checkpoint does not exist
    NotFound,
    /// Undo at the root or redo with nothing to redo
    Boundary,
    /// Snapshot backend or worker failure; may succeed on retry
    Backend,
    /// Caller-supplied data could not be interpreted
    Internal,
}

/// Error types for checkpoint operations
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoints are disabled: {reason}")]
    Disabled { reason: DisabledReason },

    #[error("No checkpoints available")]
    NoCheckpoints,

    #[error("Checkpoint {id} not found")]
    CheckpointNotFound { id: CheckpointId },

    #[error("Already at earliest change")]
    AlreadyAtEarliest,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Snapshot {operation} failed: {source}")]
    Backend {
        operation: OperationKind,
        #[source]
        source: BackendError,
    },

    #[error("Snapshot {operation} timed out after {seconds}s")]
    Timeout {
        operation: OperationKind,
        seconds: u64,
    },

    #[error("Snapshot worker exited during {operation}")]
    WorkerExited { operation: OperationKind },

    #[error("File snapshot for checkpoint {id} failed: {message}")]
    SnapshotFailed { id: CheckpointId, message: String },

    #[error("Checkpoint history is full")]
    HistoryFull,

    #[error("Worker error: {message}")]
    Worker { message: String },

    #[error("Invalid agent state: {message}")]
    AgentState { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckpointError {
    /// Create a worker protocol error
    pub fn worker<S: Into<String>>(message: S) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Create an agent state error
    pub fn agent_state<S: Into<String>>(message: S) -> Self {
        Self::AgentState {
            message: message.into(),
        }
    }

    /// Wrap a backend error raised outside the worker
    pub fn query(source: BackendError) -> Self {
        Self::Backend {
            operation: OperationKind::Query,
            source,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckpointError::Disabled { .. } => ErrorKind::Disabled,
            CheckpointError::NoCheckpoints | CheckpointError::CheckpointNotFound { .. } => {
                ErrorKind::NotFound
            }
            CheckpointError::AlreadyAtEarliest | CheckpointError::NothingToRedo => {
                ErrorKind::Boundary
            }
            CheckpointError::Backend { .. }
            | CheckpointError::Timeout { .. }
            | CheckpointError::WorkerExited { .. }
            | CheckpointError::SnapshotFailed { .. } => ErrorKind::Backend,
            CheckpointError::HistoryFull
            | CheckpointError::Worker { .. }
            | CheckpointError::AgentState { .. }
            | CheckpointError::Io(_) => ErrorKind::Internal,
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Backend
    }

    /// The disablement reason, if this is a disablement error
    pub fn disabled_reason(&self) -> Option<&DisabledReason> {
        match self {
            CheckpointError::Disabled { reason } => Some(reason),
            _ => None,
        }
    }

    /// Get a user-friendly error message with recovery suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            CheckpointError::Disabled { reason } => match reason {
                DisabledReason::GitUnavailable => {
                    "Checkpoints are disabled because git is not installed. Install git and restart the session to enable undo.".to_string()
                }
                DisabledReason::InHomeDirectory => {
                    "Checkpoints are disabled in your home directory. Start the agent inside a project folder to enable undo.".to_string()
                }
                DisabledReason::ProjectTooLarge { file_count, max_files } => format!(
                    "Checkpoints are disabled: the project has {} files (limit {}). Raise checkpointing.max_files to enable undo.",
                    file_count, max_files
                ),
                DisabledReason::DisabledByConfig => {
                    "Checkpoints are turned off in the configuration.".to_string()
                }
            },
            CheckpointError::NoCheckpoints => {
                "No checkpoints yet. Send a prompt or save a checkpoint first.".to_string()
            }
            CheckpointError::CheckpointNotFound { id } => {
                format!("Checkpoint {} does not exist. List checkpoints to see valid ids.", id)
            }
            CheckpointError::Timeout { .. } | CheckpointError::WorkerExited { .. } => {
                format!("{}. The operation can be retried.", self)
            }
            _ => self.to_string(),
        }
    }
}
