//! Configuration structures for the checkpoint system

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tracked-file count at which checkpoints are disabled for a project
pub const DEFAULT_MAX_FILES: usize = 10_000;

/// Per-call timeout for snapshot worker requests
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Characters of user input shown per checkpoint in listings
pub const DEFAULT_PREVIEW_CHARS: usize = 60;

/// Checkpoint configuration (`[checkpointing]` table)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CheckpointConfig {
    pub enabled: bool,                 // Master enable/disable switch
    pub storage_location: PathBuf,     // Where side repositories live; `~` is expanded
    pub max_files: usize,              // Disable when the tracked file set reaches this
    pub rpc_timeout_secs: u64,         // Per-call worker timeout
    pub git_binary: String,            // git executable name or path
    pub author_name: String,           // Identity recorded on snapshot commits
    pub author_email: String,
    pub preview_chars: usize,          // User input width in history listings
    pub show_message_counts: bool,     // Show conversation length in listings
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            storage_location: get_default_storage_location(),
            max_files: DEFAULT_MAX_FILES,
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
            git_binary: "git".to_string(),
            author_name: "agent-rewind".to_string(),
            author_email: "agent-rewind@localhost".to_string(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
            show_message_counts: true,
        }
    }
}

impl CheckpointConfig {
    /// Worker timeout as a duration
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Storage location with `~` and environment variables expanded
    pub fn resolved_storage_location(&self) -> PathBuf {
        let raw = self.storage_location.to_string_lossy();
        match shellexpand::full(&raw) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => self.storage_location.clone(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_files == 0 {
            return Err("max_files must be greater than 0".to_string());
        }
        if self.rpc_timeout_secs == 0 {
            return Err("rpc_timeout_secs must be greater than 0".to_string());
        }
        if self.git_binary.trim().is_empty() {
            return Err("git_binary must not be empty".to_string());
        }
        if self.preview_chars < 4 {
            return Err("preview_chars must be at least 4".to_string());
        }
        Ok(())
    }
}

/// Get default storage location (~/.agent-rewind/checkpoints)
fn get_default_storage_location() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".agent-rewind")
        .join("checkpoints")
}
