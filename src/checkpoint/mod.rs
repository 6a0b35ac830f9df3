//! Agent Checkpoint System
//!
//! Undo and redo for coding agents. Each checkpoint pairs an opaque snapshot
//! of the agent's conversation state with a snapshot of the project's
//! tracked files, kept in a side git repository outside the project.
//!
//! This module provides:
//! - Linear-branching history with undo/redo over checkpoints
//! - A background snapshot worker with request correlation and timeouts
//! - Git-backed and in-memory snapshot stores
//! - Sticky, session-wide disablement when checkpoints cannot work
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agent_rewind::checkpoint::{CheckpointConfig, CheckpointManager, CheckpointResult};
//!
//! async fn example(agent_state: Vec<u8>) -> CheckpointResult<()> {
//!     let mut manager = CheckpointManager::from_config(".", CheckpointConfig::default());
//!
//!     let added = manager
//!         .add_checkpoint(agent_state, Vec::new(), "add a README", false)
//!         .await?;
//!     println!("checkpoint #{} (new: {})", added.checkpoint.id, added.created);
//!
//!     let undone = manager.undo().await?;
//!     println!("back at #{}, undid {:?}", undone.restored.id, undone.undone_input);
//!     println!("{}", manager.format_history());
//!     Ok(())
//! }
//! ```

pub mod agent_state;
pub mod backend;
pub mod config;
pub mod errors;
pub mod formatter;
pub mod guard;
pub mod history;
pub mod manager;
pub mod models;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export key types for convenience
pub use agent_state::{AgentStateInspector, JsonAgentState};
pub use backend::{BackendError, GitSnapshotBackend, MemoryBackend, SnapshotBackend};
pub use config::{CheckpointConfig, DEFAULT_MAX_FILES, DEFAULT_RPC_TIMEOUT_SECS};
pub use errors::{CheckpointError, CheckpointResult, ErrorKind, OperationKind};
pub use formatter::{format_history, FormatOptions};
pub use guard::DisabledReason;
pub use history::CheckpointHistory;
pub use manager::CheckpointManager;
pub use models::{
    AddOutcome, Checkpoint, CheckpointId, CheckpointSummary, CommitId, FileState,
    FileStateHandle, StoreId, UndoOutcome,
};
pub use worker::{RequestId, WorkerChannel, WorkerOp, WorkerReply};
