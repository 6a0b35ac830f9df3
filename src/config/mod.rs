//! Configuration management for agent-rewind.
//!
//! This module provides configuration loading through TOML files and
//! environment variable overrides via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use agent_rewind::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! // Load environment variables
//! let env = EnvironmentLoader::new(None);
//!
//! // Load configuration from TOML
//! let mut loader = ConfigurationLoader::new(Some(Path::new("config/rewind.toml"))).unwrap();
//! env.apply_to(&mut loader.config);
//!
//! println!("Max files: {}", loader.config.checkpointing.max_files);
//! println!("Log level: {}", loader.config.logging.level);
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    Configuration, ConfigurationLoader, LogFormat, LoggingConfig, DEFAULT_CONFIG_PATH,
};
pub use self::environment::EnvironmentLoader;
