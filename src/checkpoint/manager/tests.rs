use super::*;
use crate::checkpoint::models::FileState;
use crate::checkpoint::test_utils::FlakyBackend;
use serde_json::json;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

struct Fixture {
    dir: TempDir,
    backend: Arc<FlakyBackend>,
    manager: CheckpointManager,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(CheckpointConfig::default())
    }

    fn with_config(config: CheckpointConfig) -> Self {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FlakyBackend::new());
        let manager = CheckpointManager::new(dir.path(), backend.clone(), config)
            .with_home_dir(None);
        Self {
            dir,
            backend,
            manager,
        }
    }

    fn write(&self, name: &str, content: &str) {
        std::fs::write(self.dir.path().join(name), content).unwrap();
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).unwrap()
    }

    /// Add a checkpoint and wait for its file snapshot, so later writes
    /// in the test cannot leak into it
    async fn add(&mut self, input: &str, force: bool) -> AddOutcome {
        let outcome = self
            .manager
            .add_checkpoint(agent_state(&["a.txt"], 2), Vec::new(), input, force)
            .await
            .unwrap();
        self.manager.settle_snapshots().await;
        outcome
    }

    async fn add_err(&mut self) -> CheckpointError {
        self.manager
            .add_checkpoint(agent_state(&["a.txt"], 1), Vec::new(), "x", true)
            .await
            .unwrap_err()
    }

    fn ids(&self) -> Vec<u32> {
        self.manager
            .history()
            .records()
            .iter()
            .map(|c| c.id.get())
            .collect()
    }
}

fn agent_state(files: &[&str], messages: usize) -> Vec<u8> {
    let messages: Vec<_> = (0..messages).map(|i| json!({"index": i})).collect();
    serde_json::to_vec(&json!({"messages": messages, "file_tree": files})).unwrap()
}

fn id(n: u32) -> CheckpointId {
    CheckpointId::new(n)
}

#[tokio::test]
async fn test_ids_are_dense_across_undo_and_redo() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;
    fx.write("a.txt", "two");
    fx.add("second", false).await;

    fx.manager.undo().await.unwrap();
    fx.manager.redo().await.unwrap();
    fx.manager.undo().await.unwrap();

    fx.write("a.txt", "three");
    fx.add("third", false).await;
    fx.add("fourth", true).await;

    assert_eq!(fx.ids(), vec![1, 2, 3, 4]);
    assert_eq!(fx.manager.current_checkpoint_id(), Some(id(4)));
}

#[tokio::test]
async fn test_unchanged_project_reuses_latest() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "same");
    let first = fx.add("first", false).await;
    assert!(first.created);

    let second = fx.add("second", false).await;
    assert!(!second.created);
    assert_eq!(second.checkpoint.id, id(1));
    assert_eq!(fx.manager.history().len(), 1);
    assert_eq!(fx.backend.store_calls(), 1);
}

#[tokio::test]
async fn test_unchanged_project_reuses_latest_while_store_in_flight() {
    let mut fx = Fixture::new();
    fx.backend.set_delay(Duration::from_millis(30));
    fx.write("a.txt", "same");

    let first = fx
        .manager
        .add_checkpoint(agent_state(&["a.txt"], 2), Vec::new(), "first", false)
        .await
        .unwrap();
    assert!(first.created);
    assert!(first.checkpoint.file_state.state().is_pending());

    let second = fx
        .manager
        .add_checkpoint(agent_state(&["a.txt"], 2), Vec::new(), "second", false)
        .await
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.checkpoint.id, id(1));
    assert_eq!(fx.manager.history().len(), 1);
    assert_eq!(fx.backend.store_calls(), 1);
}

#[tokio::test]
async fn test_forced_snapshot_always_appends() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "same");
    fx.add("first", false).await;

    let forced = fx.add("again", true).await;
    assert!(forced.created);
    assert_eq!(forced.checkpoint.id, id(2));
    assert_eq!(forced.checkpoint.parent_id, Some(id(1)));
    assert_eq!(fx.backend.store_calls(), 2);
}

#[tokio::test]
async fn test_new_checkpoint_invalidates_redo() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;
    fx.write("a.txt", "two");
    fx.add("second", false).await;

    fx.manager.undo().await.unwrap();
    assert!(fx.manager.can_redo());

    fx.write("a.txt", "branch");
    fx.add("branch", false).await;
    assert!(!fx.manager.can_redo());

    let err = fx.manager.redo().await.unwrap_err();
    assert!(matches!(err, CheckpointError::NothingToRedo));
    assert_eq!(err.to_string(), "Nothing to redo");
}

#[tokio::test]
async fn test_undo_at_root_is_a_boundary() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;
    assert!(!fx.manager.can_undo());

    let err = fx.manager.undo().await.unwrap_err();
    assert!(matches!(err, CheckpointError::AlreadyAtEarliest));
    assert_eq!(fx.manager.current_checkpoint_id(), Some(id(1)));
    assert_eq!(fx.backend.restore_calls(), 0);
}

#[tokio::test]
async fn test_undo_on_empty_history() {
    let mut fx = Fixture::new();
    let err = fx.manager.undo().await.unwrap_err();
    assert!(matches!(err, CheckpointError::NoCheckpoints));
}

#[tokio::test]
async fn test_redo_failure_is_rolled_back() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;
    fx.write("a.txt", "two");
    fx.add("second", false).await;
    fx.manager.undo().await.unwrap();
    assert_eq!(fx.read("a.txt"), "one");

    fx.backend.fail_next_restores(1);
    let err = fx.manager.redo().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(fx.manager.history().undo_stack(), &[id(2)]);
    assert_eq!(fx.manager.current_checkpoint_id(), Some(id(1)));

    let restored = fx.manager.redo().await.unwrap();
    assert_eq!(restored.id, id(2));
    assert_eq!(fx.read("a.txt"), "two");
    assert!(fx.manager.history().undo_stack().is_empty());
}

#[tokio::test]
async fn test_undo_failure_leaves_state_untouched() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;
    fx.write("a.txt", "two");
    fx.add("second", false).await;

    fx.backend.fail_next_restores(1);
    assert!(fx.manager.undo().await.is_err());
    assert_eq!(fx.manager.current_checkpoint_id(), Some(id(2)));
    assert!(fx.manager.history().undo_stack().is_empty());
    assert_eq!(fx.read("a.txt"), "two");
}

#[tokio::test]
async fn test_undo_returns_undone_input() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("create file", false).await;
    fx.write("a.txt", "two");
    fx.add("rewrite file", false).await;

    let outcome = fx.manager.undo().await.unwrap();
    assert_eq!(outcome.restored.id, id(1));
    assert_eq!(outcome.undone_input, "rewrite file");
    assert_eq!(fx.read("a.txt"), "one");
}

#[tokio::test]
async fn test_disablement_is_sticky() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.backend.set_available(false);

    let err = fx.add_err().await;
    assert_eq!(err.disabled_reason(), Some(&DisabledReason::GitUnavailable));

    fx.backend.set_available(true);
    fx.manager.clear_checkpoints(false);
    let err = fx.add_err().await;
    assert_eq!(err.disabled_reason(), Some(&DisabledReason::GitUnavailable));

    let err = fx.manager.get_latest_checkpoint().unwrap_err();
    assert_eq!(err.disabled_reason(), Some(&DisabledReason::GitUnavailable));
    assert!(matches!(
        fx.manager.undo().await,
        Err(CheckpointError::Disabled { .. })
    ));
    assert!(matches!(
        fx.manager.redo().await,
        Err(CheckpointError::Disabled { .. })
    ));
    assert_eq!(
        fx.manager.format_history(),
        "Checkpoints disabled: git unavailable"
    );
}

#[tokio::test]
async fn test_home_directory_guard() {
    let mut fx = Fixture::new();
    let home = fx.dir.path().to_path_buf();
    fx.manager = CheckpointManager::new(&home, fx.backend.clone(), CheckpointConfig::default())
        .with_home_dir(Some(home.clone()));

    let err = fx.add_err().await;
    assert_eq!(err.disabled_reason(), Some(&DisabledReason::InHomeDirectory));
    assert!(fx.manager.is_disabled());
}

#[tokio::test]
async fn test_project_too_large_guard() {
    let config = CheckpointConfig {
        max_files: 2,
        ..CheckpointConfig::default()
    };
    let mut fx = Fixture::with_config(config);
    let err = fx
        .manager
        .add_checkpoint(agent_state(&["a.txt", "b.txt"], 1), Vec::new(), "big", false)
        .await
        .unwrap_err();

    assert_eq!(
        err.disabled_reason(),
        Some(&DisabledReason::ProjectTooLarge {
            file_count: 2,
            max_files: 2
        })
    );
    assert_eq!(fx.backend.store_calls(), 0);
}

#[tokio::test]
async fn test_disabled_by_config() {
    let config = CheckpointConfig {
        enabled: false,
        ..CheckpointConfig::default()
    };
    let mut fx = Fixture::with_config(config);
    assert_eq!(
        fx.manager.disabled_reason(),
        Some(&DisabledReason::DisabledByConfig)
    );
    let err = fx.add_err().await;
    assert_eq!(err.kind(), ErrorKind::Disabled);
}

#[tokio::test]
async fn test_scenario_restore_reproduces_content() {
    let mut fx = Fixture::new();
    let mut commits = Vec::new();
    for content in ["v1", "v2", "v3"] {
        fx.write("a.txt", content);
        let outcome = fx.add(content, false).await;
        assert!(outcome.created);
        let commit = outcome
            .checkpoint
            .file_state
            .resolve(outcome.checkpoint.id)
            .await
            .unwrap();
        commits.push(commit);
    }
    assert_eq!(fx.ids(), vec![1, 2, 3]);
    assert_ne!(commits[0], commits[1]);
    assert_ne!(commits[1], commits[2]);

    let restored = fx
        .manager
        .restore_checkpoint_file_state(id(2), false)
        .await
        .unwrap();
    assert_eq!(restored.id, id(2));
    assert_eq!(fx.read("a.txt"), "v2");
    assert_eq!(fx.manager.current_checkpoint_id(), Some(id(2)));
}

#[tokio::test]
async fn test_scenario_branching_parent_links() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;
    fx.write("a.txt", "two");
    fx.add("second", false).await;
    fx.manager.undo().await.unwrap();
    fx.write("a.txt", "other");
    let third = fx.add("third", false).await;

    assert_eq!(third.checkpoint.id, id(3));
    assert_eq!(third.checkpoint.parent_id, Some(id(1)));
    let records = fx.manager.history().records();
    assert_eq!(records[1].parent_id, Some(id(1)));
    assert_eq!(records[0].parent_id, None);
}

#[tokio::test]
async fn test_scenario_branching_with_stores_in_flight() {
    let mut fx = Fixture::new();
    fx.backend.set_delay(Duration::from_millis(20));
    fx.write("a.txt", "one");

    let state = || agent_state(&["a.txt"], 2);
    let first = fx
        .manager
        .add_checkpoint(state(), Vec::new(), "first", false)
        .await
        .unwrap();
    let second = fx
        .manager
        .add_checkpoint(state(), Vec::new(), "second", true)
        .await
        .unwrap();
    assert!(second.checkpoint.file_state.state().is_pending());

    let undone = fx.manager.undo().await.unwrap();
    assert_eq!(undone.restored.id, first.checkpoint.id);
    assert!(matches!(
        second.checkpoint.file_state.state(),
        FileState::Resolved(_)
    ));

    let third = fx
        .manager
        .add_checkpoint(state(), Vec::new(), "third", true)
        .await
        .unwrap();
    assert_eq!(third.checkpoint.id, id(3));
    assert_eq!(third.checkpoint.parent_id, Some(id(1)));
    assert_eq!(fx.manager.history().records()[1].parent_id, Some(id(1)));
    assert!(!fx.manager.can_redo());

    fx.manager.settle_snapshots().await;
    assert_eq!(fx.backend.store_calls(), 3);
    assert_eq!(fx.read("a.txt"), "one");
}

#[tokio::test]
async fn test_scenario_latest_checkpoint() {
    let mut fx = Fixture::new();
    assert!(matches!(
        fx.manager.get_latest_checkpoint(),
        Err(CheckpointError::NoCheckpoints)
    ));

    fx.write("a.txt", "one");
    let added = fx.add("first", false).await;
    let latest = fx.manager.get_latest_checkpoint().unwrap();
    assert_eq!(latest.id, added.checkpoint.id);
    assert_eq!(latest.user_input, "first");
    assert_eq!(latest.history_length, 2);
}

#[tokio::test]
async fn test_restore_waits_for_pending_snapshot() {
    let mut fx = Fixture::new();
    fx.backend.set_delay(Duration::from_millis(50));
    fx.write("a.txt", "one");
    let added = fx
        .manager
        .add_checkpoint(agent_state(&["a.txt"], 2), Vec::new(), "first", false)
        .await
        .unwrap();
    assert!(added.checkpoint.file_state.state().is_pending());

    fx.manager
        .restore_checkpoint_file_state(id(1), true)
        .await
        .unwrap();
    assert!(matches!(
        added.checkpoint.file_state.state(),
        FileState::Resolved(_)
    ));
    assert_eq!(fx.backend.store_calls(), 1);
    assert_eq!(fx.backend.restore_calls(), 1);
}

#[tokio::test]
async fn test_failed_snapshot_blocks_restore() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;
    fx.write("a.txt", "two");
    fx.backend.fail_next_stores(1);
    let second = fx.add("second", false).await;
    assert!(second.created);
    assert!(matches!(
        second.checkpoint.file_state.state(),
        FileState::Failed(_)
    ));

    fx.manager.undo().await.unwrap();
    let err = fx
        .manager
        .restore_checkpoint_file_state(id(2), false)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckpointError::SnapshotFailed { .. }));
    assert_eq!(fx.manager.current_checkpoint_id(), Some(id(1)));
}

#[tokio::test]
async fn test_restore_unknown_checkpoint() {
    let mut fx = Fixture::new();
    assert!(matches!(
        fx.manager.restore_checkpoint_file_state(id(1), false).await,
        Err(CheckpointError::NoCheckpoints)
    ));

    fx.write("a.txt", "one");
    fx.add("first", false).await;
    assert!(matches!(
        fx.manager.restore_checkpoint_file_state(id(9), false).await,
        Err(CheckpointError::CheckpointNotFound { .. })
    ));
}

#[tokio::test]
async fn test_restore_with_reset_clears_undo_stack() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;
    fx.write("a.txt", "two");
    fx.add("second", false).await;
    fx.manager.undo().await.unwrap();
    assert!(fx.manager.can_redo());

    fx.manager
        .restore_checkpoint_file_state(id(2), true)
        .await
        .unwrap();
    assert!(!fx.manager.can_redo());
    assert_eq!(fx.read("a.txt"), "two");
}

#[tokio::test]
async fn test_clear_resets_ids() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;

    fx.manager.clear_checkpoints(true);
    assert!(fx.manager.history().is_empty());
    assert_eq!(fx.manager.current_checkpoint_id(), None);

    fx.write("a.txt", "two");
    let added = fx.add("again", false).await;
    assert_eq!(added.checkpoint.id, id(1));
    assert_eq!(added.checkpoint.parent_id, None);
}

#[tokio::test]
async fn test_fresh_session_links_existing_snapshot() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    let first = fx.add("first", false).await;
    let commit = first.checkpoint.file_state.resolve(id(1)).await.unwrap();

    let mut resumed = CheckpointManager::new(
        fx.dir.path(),
        fx.backend.clone(),
        CheckpointConfig::default(),
    )
    .with_home_dir(None);
    let outcome = resumed
        .add_checkpoint(agent_state(&["a.txt"], 4), Vec::new(), "resume", false)
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.checkpoint.id, id(1));
    assert_eq!(
        outcome.checkpoint.file_state.resolve(id(1)).await.unwrap(),
        commit
    );
    assert_eq!(fx.backend.store_calls(), 1);
}

#[tokio::test]
async fn test_switch_project() {
    let mut fx = Fixture::new();
    fx.write("a.txt", "one");
    fx.add("first", false).await;

    let other = tempdir().unwrap();
    fx.manager.switch_project(other.path());
    assert_eq!(fx.manager.project_dir(), other.path());
    assert!(fx.manager.history().is_empty());

    std::fs::write(other.path().join("a.txt"), "elsewhere").unwrap();
    let added = fx.add("there", false).await;
    assert_eq!(added.checkpoint.id, id(1));
}

#[tokio::test]
async fn test_listing_and_formatting() {
    let mut fx = Fixture::new();
    assert_eq!(fx.manager.format_history(), "No checkpoints available.");

    fx.write("a.txt", "one");
    fx.add("first prompt", false).await;
    fx.write("a.txt", "two");
    fx.add("second prompt", false).await;
    fx.manager.undo().await.unwrap();

    let summaries = fx.manager.list_checkpoints();
    assert_eq!(summaries.len(), 2);
    assert!(summaries[0].is_current);
    assert!(!summaries[1].is_current);
    assert!(matches!(summaries[0].file_state, FileState::Resolved(_)));

    let text = fx.manager.format_history();
    assert!(text.starts_with("Checkpoints (current: #1)"));
    assert!(text.contains("first prompt"));
    assert!(text.contains("second prompt"));
}

#[tokio::test]
async fn test_invalid_agent_state() {
    let mut fx = Fixture::new();
    let err = fx
        .manager
        .add_checkpoint(b"not json".to_vec(), Vec::new(), "x", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(!fx.manager.is_disabled());
}

#[test]
fn test_snapshot_message() {
    assert_eq!(
        snapshot_message(id(3), "fix\nthe bug"),
        "checkpoint 3: fix the bug"
    );
}
