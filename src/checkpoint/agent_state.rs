//! Agent state inspection
//!
//! The manager treats agent state as opaque bytes. The few facts it needs
//! from it (the tracked file set and the conversation length) come through
//! an [`AgentStateInspector`].

use super::errors::{CheckpointError, CheckpointResult};
use serde::Deserialize;
use std::path::PathBuf;

/// Reads the facts the checkpoint manager needs out of a serialized agent state
pub trait AgentStateInspector: Send + Sync {
    /// Project-relative paths of the files the agent tracks
    fn tracked_paths(&self, agent_state: &[u8]) -> CheckpointResult<Vec<PathBuf>>;

    /// Number of conversation messages, for display
    fn history_length(&self, agent_state: &[u8]) -> usize;
}

/// Inspector for JSON agent state of the form
/// `{"messages": [...], "file_tree": ["rel/path", ...]}`.
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAgentState;

#[derive(Deserialize)]
struct FileTreeView {
    #[serde(default)]
    file_tree: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct MessagesView {
    #[serde(default)]
    messages: Vec<serde::de::IgnoredAny>,
}

impl AgentStateInspector for JsonAgentState {
    fn tracked_paths(&self, agent_state: &[u8]) -> CheckpointResult<Vec<PathBuf>> {
        if agent_state.is_empty() {
            return Ok(Vec::new());
        }
        let view: FileTreeView = serde_json::from_slice(agent_state)
            .map_err(|e| CheckpointError::agent_state(format!("cannot read file tree: {}", e)))?;

        let mut paths = view.file_tree;
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    fn history_length(&self, agent_state: &[u8]) -> usize {
        serde_json::from_slice::<MessagesView>(agent_state)
            .map(|view| view.messages.len())
            .unwrap_or(0)
    }
}
