//! Data models for the checkpoint system

use super::errors::{CheckpointError, CheckpointResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Sequential checkpoint identifier, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointId(u32);

impl CheckpointId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Parse a user-supplied id; zero and non-numbers are rejected
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_start_matches('#').parse::<u32>() {
            Ok(0) | Err(_) => None,
            Ok(id) => Some(Self(id)),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Index of this checkpoint in the history array
    pub(crate) fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content-addressed identifier of a stored file-tree snapshot (a commit hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        let end = self.0.len().min(10);
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of the snapshot store for one project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub PathBuf);

impl StoreId {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// State of a checkpoint's file-tree snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum FileState {
    /// The commit is still being written
    Pending,
    /// The commit exists in the store
    Resolved(CommitId),
    /// The commit could not be written
    Failed(String),
}

impl FileState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FileState::Pending)
    }

    pub fn commit(&self) -> Option<&CommitId> {
        match self {
            FileState::Resolved(commit) => Some(commit),
            _ => None,
        }
    }
}

/// Joinable handle to a checkpoint's file state.
///
/// Cloning is cheap; every clone observes the same resolution.
#[derive(Clone)]
pub struct FileStateHandle {
    state: watch::Receiver<FileState>,
}

impl FileStateHandle {
    /// Handle for a commit that already exists
    pub fn resolved(commit: CommitId) -> Self {
        let (_sender, state) = watch::channel(FileState::Resolved(commit));
        Self { state }
    }

    /// Run `snapshot` in the background and resolve the handle with its result.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(snapshot: F) -> Self
    where
        F: Future<Output = CheckpointResult<CommitId>> + Send + 'static,
    {
        let (sender, state) = watch::channel(FileState::Pending);
        tokio::spawn(async move {
            let resolved = match snapshot.await {
                Ok(commit) => FileState::Resolved(commit),
                Err(e) => FileState::Failed(e.to_string()),
            };
            // Nobody listening is fine; the checkpoint was dropped.
            let _ = sender.send(resolved);
        });
        Self { state }
    }

    /// Current state without waiting
    pub fn state(&self) -> FileState {
        self.state.borrow().clone()
    }

    /// Wait until the snapshot is written and return its commit id
    pub async fn resolve(&self, id: CheckpointId) -> CheckpointResult<CommitId> {
        let mut state = self.state.clone();
        let resolved = state
            .wait_for(|s| !s.is_pending())
            .await
            .map_err(|_| CheckpointError::SnapshotFailed {
                id,
                message: "snapshot task ended without a result".to_string(),
            })?
            .clone();

        match resolved {
            FileState::Resolved(commit) => Ok(commit),
            FileState::Failed(message) => Err(CheckpointError::SnapshotFailed { id, message }),
            FileState::Pending => Err(CheckpointError::SnapshotFailed {
                id,
                message: "snapshot still pending".to_string(),
            }),
        }
    }
}

impl fmt::Debug for FileStateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileStateHandle").field(&self.state()).finish()
    }
}

/// A paired snapshot of conversation state and file-tree state
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub id: CheckpointId,
    /// Checkpoint that was current when this one was created
    pub parent_id: Option<CheckpointId>,
    pub created_at: DateTime<Utc>,
    /// Prompt that led to this checkpoint
    pub user_input: String,
    pub agent_state: Vec<u8>,
    pub last_tool_results: Vec<u8>,
    /// Conversation length at snapshot time, display only
    pub history_length: usize,
    pub file_state: FileStateHandle,
}

impl Checkpoint {
    /// Serializable view of this checkpoint
    pub fn summary(&self, current: Option<CheckpointId>) -> CheckpointSummary {
        CheckpointSummary {
            id: self.id,
            parent_id: self.parent_id,
            created_at: self.created_at,
            user_input: self.user_input.clone(),
            history_length: self.history_length,
            file_state: self.file_state.state(),
            is_current: current == Some(self.id),
        }
    }
}

/// Compact, serializable view of a checkpoint for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub id: CheckpointId,
    pub parent_id: Option<CheckpointId>,
    pub created_at: DateTime<Utc>,
    pub user_input: String,
    pub history_length: usize,
    pub file_state: FileState,
    pub is_current: bool,
}

/// Result of `add_checkpoint`
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub checkpoint: Checkpoint,
    /// False when nothing changed and the latest checkpoint was returned
    pub created: bool,
}

/// Result of a successful undo
#[derive(Debug, Clone)]
pub struct UndoOutcome {
    /// Checkpoint the working tree now reflects
    pub restored: Checkpoint,
    /// Prompt of the checkpoint that was undone, for re-populating the input
    pub undone_input: String,
}
