//! TOML configuration parsing and management.

use crate::checkpoint::CheckpointConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file used when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/rewind.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub checkpointing: CheckpointConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. "info" or "agent_rewind=debug"
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    pub config_path: PathBuf,
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, `config/rewind.toml`
    ///   is tried. A missing file yields the default configuration.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Configuration::default()
        };

        config
            .checkpointing
            .validate()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Invalid [checkpointing] in {}", config_path.display()))?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Create a configuration loader from a pre-parsed Configuration.
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            config,
        }
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        let checkpointing = &self.config.checkpointing;
        match key {
            "checkpointing.storage_location" => Some(
                checkpointing
                    .resolved_storage_location()
                    .to_string_lossy()
                    .to_string(),
            ),
            "checkpointing.git_binary" => Some(checkpointing.git_binary.clone()),
            "logging.level" => Some(self.config.logging.level.clone()),
            "logging.format" => Some(self.config.logging.format.to_string()),
            _ => None,
        }
    }

    /// Get numeric configuration value.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        let checkpointing = &self.config.checkpointing;
        match key {
            "checkpointing.max_files" => Some(checkpointing.max_files as u64),
            "checkpointing.rpc_timeout_secs" => Some(checkpointing.rpc_timeout_secs),
            "checkpointing.preview_chars" => Some(checkpointing.preview_chars as u64),
            _ => None,
        }
    }

    /// Get boolean configuration value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            "checkpointing.enabled" => Some(self.config.checkpointing.enabled),
            "checkpointing.show_message_counts" => {
                Some(self.config.checkpointing.show_message_counts)
            }
            _ => None,
        }
    }
}
