//! Snapshot Backend Traits
//!
//! Defines the content-addressed store that holds file-tree snapshots.

use crate::checkpoint::models::{CommitId, StoreId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// A git command exited unsuccessfully
    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    /// IO error during a backend operation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store has no snapshot yet
    #[error("No snapshots stored yet")]
    NoSnapshots,

    /// The requested commit is not in the store
    #[error("Unknown snapshot: {0}")]
    UnknownSnapshot(String),

    /// A path escapes the project directory
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    /// Generic backend error
    #[error("Backend error: {0}")]
    Other(String),
}

impl BackendError {
    pub fn git<C: Into<String>, S: Into<String>>(command: C, stderr: S) -> Self {
        Self::Git {
            command: command.into(),
            stderr: stderr.into(),
        }
    }
}

/// Content-addressed store for project file trees.
///
/// One store serves one project. `paths` are relative to the project
/// directory and name the tracked file set of a snapshot.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Backend type name (e.g. "git", "memory")
    fn backend_type(&self) -> &'static str;

    /// Whether the backend tooling can be used at all
    async fn is_available(&self) -> bool;

    /// Resolve or create the store for a project. Idempotent.
    async fn locate(&self, project_dir: &Path) -> BackendResult<StoreId>;

    /// True if any tracked path differs from the most recent snapshot
    async fn has_unsaved_changes(
        &self,
        project_dir: &Path,
        store: &StoreId,
        paths: &[PathBuf],
    ) -> BackendResult<bool>;

    /// Identifier of the most recent snapshot
    async fn latest_snapshot_id(&self, store: &StoreId) -> BackendResult<CommitId>;

    /// Snapshot the current contents of `paths`
    async fn store(
        &self,
        project_dir: &Path,
        store: &StoreId,
        message: &str,
        paths: &[PathBuf],
    ) -> BackendResult<CommitId>;

    /// Overwrite `paths` in `project_dir` with their contents as of `commit`
    async fn restore(
        &self,
        project_dir: &Path,
        store: &StoreId,
        commit: &CommitId,
        paths: &[PathBuf],
    ) -> BackendResult<()>;
}

/// Normalize a tracked path to the `/`-separated form stores use as a key.
///
/// Absolute paths and `..` components are rejected; `.` components are dropped.
pub(crate) fn normalize_relative(path: &Path) -> BackendResult<String> {
    use std::path::Component;

    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(BackendError::InvalidPath(path.to_path_buf()));
            }
        }
    }
    if parts.is_empty() {
        return Err(BackendError::InvalidPath(path.to_path_buf()));
    }
    Ok(parts.join("/"))
}
