//! Checkpoint manager
//!
//! Pairs each agent-state snapshot with a file-tree snapshot and moves the
//! project between them. One manager serves one project session.
//!
//! File snapshots are written in the background by the snapshot worker;
//! a checkpoint's file state resolves once its commit exists. Restoring a
//! checkpoint always waits for that commit first.

use super::agent_state::{AgentStateInspector, JsonAgentState};
use super::backend::{GitSnapshotBackend, SnapshotBackend};
use super::config::CheckpointConfig;
use super::errors::{CheckpointError, CheckpointResult, ErrorKind};
use super::formatter::{self, FormatOptions};
use super::guard::{DisabledReason, DisablementGuard};
use super::history::CheckpointHistory;
use super::models::{
    AddOutcome, Checkpoint, CheckpointId, CheckpointSummary, FileStateHandle, StoreId,
    UndoOutcome,
};
use super::worker::WorkerChannel;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Versioning engine for agent state and project files
pub struct CheckpointManager {
    project_dir: PathBuf,
    config: CheckpointConfig,
    backend: Arc<dyn SnapshotBackend>,
    worker: Arc<WorkerChannel>,
    inspector: Arc<dyn AgentStateInspector>,
    history: CheckpointHistory,
    store: Option<StoreId>,
    guard: DisablementGuard,
    home_dir: Option<PathBuf>,
}

impl CheckpointManager {
    /// Create a manager for `project_dir` on top of `backend`.
    ///
    /// A configuration with `enabled = false` yields a manager that is
    /// disabled from the start.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        backend: Arc<dyn SnapshotBackend>,
        config: CheckpointConfig,
    ) -> Self {
        let worker = Arc::new(WorkerChannel::new(backend.clone(), config.rpc_timeout()));
        let mut guard = DisablementGuard::new();
        if !config.enabled {
            guard.disable(DisabledReason::DisabledByConfig);
        }
        Self {
            project_dir: project_dir.into(),
            config,
            backend,
            worker,
            inspector: Arc::new(JsonAgentState),
            history: CheckpointHistory::new(),
            store: None,
            guard,
            home_dir: dirs::home_dir(),
        }
    }

    /// Manager backed by the git snapshot backend described by `config`
    pub fn from_config(project_dir: impl Into<PathBuf>, config: CheckpointConfig) -> Self {
        let backend = Arc::new(GitSnapshotBackend::from_config(&config));
        Self::new(project_dir, backend, config)
    }

    /// Use a custom reader for agent state
    pub fn with_inspector(mut self, inspector: Arc<dyn AgentStateInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Override the directory treated as the user's home
    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = home_dir;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    pub fn history(&self) -> &CheckpointHistory {
        &self.history
    }

    pub fn current_checkpoint_id(&self) -> Option<CheckpointId> {
        self.history.current_id()
    }

    pub fn is_disabled(&self) -> bool {
        self.guard.is_disabled()
    }

    pub fn disabled_reason(&self) -> Option<&DisabledReason> {
        self.guard.reason()
    }

    /// Whether an undo has somewhere to go
    pub fn can_undo(&self) -> bool {
        !self.is_disabled() && self.history.undo_target().is_ok()
    }

    pub fn can_redo(&self) -> bool {
        !self.is_disabled() && self.history.can_redo()
    }

    /// Record a checkpoint for the current agent state and project files.
    ///
    /// Without `force_snapshot`, an unchanged project returns the latest
    /// checkpoint with `created == false` and nothing is appended. The file
    /// snapshot is written in the background; the returned checkpoint's
    /// `file_state` resolves when it is done. Snapshots of earlier
    /// checkpoints are awaited before the project is compared.
    pub async fn add_checkpoint(
        &mut self,
        agent_state: Vec<u8>,
        last_tool_results: Vec<u8>,
        user_input: impl Into<String>,
        force_snapshot: bool,
    ) -> CheckpointResult<AddOutcome> {
        self.guard.ensure_enabled()?;
        if !self.backend.is_available().await {
            return Err(self.guard.disable(DisabledReason::GitUnavailable));
        }
        if self.in_home_directory().await {
            return Err(self.guard.disable(DisabledReason::InHomeDirectory));
        }
        let paths = self.inspector.tracked_paths(&agent_state)?;
        if paths.len() >= self.config.max_files {
            return Err(self.guard.disable(DisabledReason::ProjectTooLarge {
                file_count: paths.len(),
                max_files: self.config.max_files,
            }));
        }

        let store = self.locate_store().await?;
        let needs_snapshot = force_snapshot || self.has_unsaved_changes(&store, &paths).await?;

        if !needs_snapshot {
            if let Some(latest) = self.history.latest() {
                debug!(checkpoint_id = %latest.id, "project unchanged, reusing latest checkpoint");
                return Ok(AddOutcome {
                    checkpoint: latest.clone(),
                    created: false,
                });
            }
        }

        let user_input = user_input.into();
        let id = self.history.next_id()?;
        let file_state = if needs_snapshot {
            self.spawn_store(id, store, paths, &user_input)
        } else {
            self.spawn_latest_lookup(id, store)
        };
        let history_length = self.inspector.history_length(&agent_state);

        let checkpoint = self
            .history
            .append(|id, parent_id| Checkpoint {
                id,
                parent_id,
                created_at: Utc::now(),
                user_input,
                agent_state,
                last_tool_results,
                history_length,
                file_state,
            })?
            .clone();

        info!(
            project = %self.project_dir.display(),
            checkpoint_id = %checkpoint.id,
            parent_id = ?checkpoint.parent_id.map(CheckpointId::get),
            snapshot = needs_snapshot,
            "checkpoint created"
        );
        Ok(AddOutcome {
            checkpoint,
            created: true,
        })
    }

    /// The most recently created checkpoint
    pub fn get_latest_checkpoint(&self) -> CheckpointResult<&Checkpoint> {
        self.guard.ensure_enabled()?;
        self.history.latest().ok_or(CheckpointError::NoCheckpoints)
    }

    /// Look up a checkpoint by id
    pub fn get_checkpoint(&self, id: CheckpointId) -> CheckpointResult<&Checkpoint> {
        self.guard.ensure_enabled()?;
        self.history.require(id)
    }

    /// Overwrite the project files with the snapshot of checkpoint `id`.
    ///
    /// Waits for the checkpoint's own file snapshot before restoring. On
    /// success `id` becomes current; on failure nothing changes.
    pub async fn restore_checkpoint_file_state(
        &mut self,
        id: CheckpointId,
        reset_undo_stack: bool,
    ) -> CheckpointResult<Checkpoint> {
        self.guard.ensure_enabled()?;
        let checkpoint = self.history.require(id)?.clone();
        let paths = self.inspector.tracked_paths(&checkpoint.agent_state)?;
        let store = self.locate_store().await?;

        let commit = checkpoint
            .file_state
            .resolve(id)
            .await
            .map_err(|e| self.log_failure("restore", Some(id), e))?;

        // Background stores still in flight would otherwise capture the
        // restored tree instead of the one they were started for.
        self.settle_snapshots().await;

        self.worker
            .restore(self.project_dir.clone(), store, commit.clone(), paths)
            .await
            .map_err(|e| self.log_failure("restore", Some(id), e))?;

        self.history.set_current(id, reset_undo_stack);
        info!(
            project = %self.project_dir.display(),
            checkpoint_id = %id,
            commit = commit.short(),
            "checkpoint restored"
        );
        Ok(checkpoint)
    }

    /// Move back to the parent of the current checkpoint
    pub async fn undo(&mut self) -> CheckpointResult<UndoOutcome> {
        self.guard.ensure_enabled()?;
        let (departed, parent) = self.history.undo_target()?;
        let restored = self.restore_checkpoint_file_state(parent, false).await?;
        self.history.push_undone(departed);

        let undone_input = self
            .history
            .get(departed)
            .map(|c| c.user_input.clone())
            .unwrap_or_default();
        Ok(UndoOutcome {
            restored,
            undone_input,
        })
    }

    /// Re-apply the most recently undone checkpoint
    pub async fn redo(&mut self) -> CheckpointResult<Checkpoint> {
        self.guard.ensure_enabled()?;
        let target = self.history.pop_redo()?;
        match self.restore_checkpoint_file_state(target, false).await {
            Ok(checkpoint) => Ok(checkpoint),
            Err(e) => {
                self.history.push_undone(target);
                Err(e)
            }
        }
    }

    /// Forget every checkpoint.
    ///
    /// With `reset_store_location`, the store is looked up again on next
    /// use. Disablement is kept.
    pub fn clear_checkpoints(&mut self, reset_store_location: bool) {
        let dropped = self.history.len();
        self.history.clear();
        if reset_store_location {
            self.store = None;
        }
        info!(
            project = %self.project_dir.display(),
            dropped,
            reset_store_location,
            "checkpoints cleared"
        );
    }

    /// Clear all checkpoints and point the manager at another project
    pub fn switch_project(&mut self, project_dir: impl Into<PathBuf>) {
        self.clear_checkpoints(true);
        self.project_dir = project_dir.into();
        info!(project = %self.project_dir.display(), "checkpoint project switched");
    }

    /// Serializable summaries of every checkpoint in creation order
    pub fn list_checkpoints(&self) -> Vec<CheckpointSummary> {
        let current = self.history.current_id();
        self.history
            .records()
            .iter()
            .map(|c| c.summary(current))
            .collect()
    }

    /// Human-readable history listing
    pub fn format_history(&self) -> String {
        formatter::format_history(
            &self.list_checkpoints(),
            self.guard.reason(),
            &FormatOptions::from(&self.config),
        )
    }

    /// Wait for every background file snapshot to finish.
    ///
    /// Failures are left in the checkpoints' file state.
    pub async fn settle_snapshots(&self) {
        for checkpoint in self.history.records() {
            if checkpoint.file_state.state().is_pending() {
                let _ = checkpoint.file_state.resolve(checkpoint.id).await;
            }
        }
    }

    async fn locate_store(&mut self) -> CheckpointResult<StoreId> {
        if let Some(store) = &self.store {
            return Ok(store.clone());
        }
        let store = self
            .backend
            .locate(&self.project_dir)
            .await
            .map_err(|e| self.log_failure("locate", None, CheckpointError::query(e)))?;
        debug!(store = %store, backend = self.backend.backend_type(), "snapshot store located");
        self.store = Some(store.clone());
        Ok(store)
    }

    fn spawn_store(
        &self,
        id: CheckpointId,
        store: StoreId,
        paths: Vec<PathBuf>,
        user_input: &str,
    ) -> FileStateHandle {
        let worker = self.worker.clone();
        let project_dir = self.project_dir.clone();
        let message = snapshot_message(id, user_input);
        FileStateHandle::spawn(async move {
            let project = project_dir.display().to_string();
            worker
                .store(project_dir, store, message, paths)
                .await
                .map_err(|e| {
                    error!(
                        project = %project,
                        operation = "store",
                        checkpoint_id = %id,
                        error = %e,
                        "file snapshot failed"
                    );
                    e
                })
        })
    }

    fn spawn_latest_lookup(&self, id: CheckpointId, store: StoreId) -> FileStateHandle {
        let backend = self.backend.clone();
        let project = self.project_dir.display().to_string();
        FileStateHandle::spawn(async move {
            backend.latest_snapshot_id(&store).await.map_err(|e| {
                let e = CheckpointError::query(e);
                error!(
                    project = %project,
                    operation = "latest_snapshot_id",
                    checkpoint_id = %id,
                    error = %e,
                    "file snapshot lookup failed"
                );
                e
            })
        })
    }

    /// Compare the project against the latest stored snapshot.
    ///
    /// Earlier snapshots still in flight are awaited first, otherwise the
    /// store has not caught up with them yet and every file looks changed.
    async fn has_unsaved_changes(
        &self,
        store: &StoreId,
        paths: &[PathBuf],
    ) -> CheckpointResult<bool> {
        self.settle_snapshots().await;
        self.backend
            .has_unsaved_changes(&self.project_dir, store, paths)
            .await
            .map_err(|e| {
                self.log_failure("has_unsaved_changes", None, CheckpointError::query(e))
            })
    }

    async fn in_home_directory(&self) -> bool {
        let Some(home) = &self.home_dir else {
            return false;
        };
        canonical(&self.project_dir).await == canonical(home).await
    }

    fn log_failure(
        &self,
        operation: &str,
        checkpoint_id: Option<CheckpointId>,
        err: CheckpointError,
    ) -> CheckpointError {
        if err.kind() == ErrorKind::Backend {
            error!(
                project = %self.project_dir.display(),
                operation,
                checkpoint_id = ?checkpoint_id.map(CheckpointId::get),
                error = %err,
                "checkpoint operation failed"
            );
        }
        err
    }
}

impl std::fmt::Debug for CheckpointManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointManager")
            .field("project_dir", &self.project_dir)
            .field("backend", &self.backend.backend_type())
            .field("checkpoints", &self.history.len())
            .field("current", &self.history.current_id())
            .field("disabled", &self.guard.reason())
            .finish()
    }
}

async fn canonical(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Commit message for a file snapshot
fn snapshot_message(id: CheckpointId, user_input: &str) -> String {
    let summary = formatter::preview(user_input, 72);
    format!("checkpoint {}: {}", id, summary)
}

#[cfg(test)]
mod tests;
