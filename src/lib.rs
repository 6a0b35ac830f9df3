//! agent-rewind - Checkpoint, undo and redo for coding agents
//!
//! agent-rewind provides a set of feature-gated modules:
//!
//! - **`checkpoint`** - Checkpoint history, snapshot worker and backends
//! - **`config`** - Configuration and environment loading
//! - **`observability`** - Tracing subscriber setup
//! - **`cli`** - Checkpoint slash-commands for agent CLIs
//!
//! # Features
//!
//! Enable the features you need in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! agent-rewind = { version = "0.3", features = ["checkpoint"] }
//! # Or enable everything:
//! agent-rewind = { version = "0.3", features = ["all"] }
//! ```
//!
//! # Example: Loading configuration
//!
//! ```ignore
//! use agent_rewind::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(None);
//! let loader = ConfigurationLoader::new(Some(Path::new("config/rewind.toml"))).unwrap();
//! let checkpointing = env.apply_overrides(loader.config.checkpointing.clone());
//! println!("max files: {}", checkpointing.max_files);
//! ```
//!
//! # Example: Checkpointing an agent session
//!
//! ```ignore
//! use agent_rewind::checkpoint::{CheckpointConfig, CheckpointManager};
//!
//! let mut manager = CheckpointManager::from_config(".", CheckpointConfig::default());
//! let added = manager.add_checkpoint(state, tool_results, "fix the tests", false).await?;
//! manager.undo().await?;
//! ```

#![warn(missing_docs)]

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Observability utilities (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// CLI commands (enabled with the `cli` feature)
#[cfg(feature = "cli")]
pub mod cli;

/// Checkpoint management (enabled with the `checkpoint` feature)
#[cfg(feature = "checkpoint")]
pub mod checkpoint;

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "config")]
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    #[cfg(feature = "observability")]
    pub use crate::observability::init_tracing;

    #[cfg(feature = "checkpoint")]
    pub use crate::checkpoint::{
        Checkpoint, CheckpointConfig, CheckpointError, CheckpointId, CheckpointManager,
        CheckpointResult, DisabledReason, SnapshotBackend,
    };

    #[cfg(feature = "cli")]
    pub use crate::cli::{run_checkpoint_command, CheckpointCommand};
}
