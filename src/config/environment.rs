//! Environment variable loading and overrides.

use super::config::Configuration;
use crate::checkpoint::CheckpointConfig;
use std::env;
use std::path::{Path, PathBuf};

/// Overrides `logging.level`
pub const ENV_LOG: &str = "AGENT_REWIND_LOG";
/// Overrides `checkpointing.storage_location`
pub const ENV_STORAGE: &str = "AGENT_REWIND_STORAGE";
/// Any truthy value turns checkpointing off
pub const ENV_DISABLE: &str = "AGENT_REWIND_DISABLE";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<PathBuf>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to a .env file to load. With None, no file is read.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file.filter(|p| p.exists()) {
            if let Err(e) = dotenv::from_path(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to load .env file");
            }
        }

        Self {
            env_file: env_file.map(Path::to_path_buf),
        }
    }

    /// The .env file this loader was created with
    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    /// Log filter from `AGENT_REWIND_LOG`
    pub fn log_level(&self) -> Option<String> {
        non_empty(ENV_LOG)
    }

    /// Storage location from `AGENT_REWIND_STORAGE`
    pub fn storage_location(&self) -> Option<PathBuf> {
        non_empty(ENV_STORAGE).map(PathBuf::from)
    }

    /// True when `AGENT_REWIND_DISABLE` is set to 1, true, yes or on
    pub fn checkpoints_disabled(&self) -> bool {
        non_empty(ENV_DISABLE)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }

    /// Apply environment overrides to a checkpoint configuration
    pub fn apply_overrides(&self, mut config: CheckpointConfig) -> CheckpointConfig {
        if let Some(location) = self.storage_location() {
            config.storage_location = location;
        }
        if self.checkpoints_disabled() {
            config.enabled = false;
        }
        config
    }

    /// Apply every environment override to a full configuration
    pub fn apply_to(&self, configuration: &mut Configuration) {
        configuration.checkpointing = self.apply_overrides(configuration.checkpointing.clone());
        if let Some(level) = self.log_level() {
            configuration.logging.level = level;
        }
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
