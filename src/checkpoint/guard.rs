//! Sticky disablement for a checkpoint manager.
//!
//! Once a guard trips, the reason is kept for the lifetime of the manager and
//! every operation reports it. There is no way back to the enabled state.

use super::errors::CheckpointError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why checkpointing was switched off for this session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DisabledReason {
    /// The git executable could not be run
    GitUnavailable,
    /// The project directory is the user's home directory
    InHomeDirectory,
    /// The tracked file set reached the configured limit
    ProjectTooLarge { file_count: usize, max_files: usize },
    /// `checkpointing.enabled = false` in configuration
    DisabledByConfig,
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisabledReason::GitUnavailable => f.write_str("git unavailable"),
            DisabledReason::InHomeDirectory => f.write_str("in home directory"),
            DisabledReason::ProjectTooLarge {
                file_count,
                max_files,
            } => write!(
                f,
                "project too large ({} files, limit {})",
                file_count, max_files
            ),
            DisabledReason::DisabledByConfig => f.write_str("disabled by configuration"),
        }
    }
}

/// Holds the sticky disablement reason
#[derive(Debug, Default)]
pub struct DisablementGuard {
    reason: Option<DisabledReason>,
}

impl DisablementGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reason, if disabled
    pub fn reason(&self) -> Option<&DisabledReason> {
        self.reason.as_ref()
    }

    pub fn is_disabled(&self) -> bool {
        self.reason.is_some()
    }

    /// Fail with the stored reason if disabled
    pub fn ensure_enabled(&self) -> Result<(), CheckpointError> {
        match &self.reason {
            Some(reason) => Err(CheckpointError::Disabled {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Trip the guard and return the resulting error.
    ///
    /// The first reason wins; later calls return the original reason.
    pub fn disable(&mut self, reason: DisabledReason) -> CheckpointError {
        match &self.reason {
            Some(existing) => CheckpointError::Disabled {
                reason: existing.clone(),
            },
            None => {
                tracing::warn!(reason = %reason, "checkpoints disabled for this session");
                self.reason = Some(reason.clone());
                CheckpointError::Disabled { reason }
            }
        }
    }
}
