//! Observability utilities for agent-rewind.
//!
//! The library itself only emits `tracing` events. Hosts that do not install
//! their own subscriber can use [`init_tracing`] to get formatted output on
//! stderr, driven by the `[logging]` configuration section.
//!
//! # Example
//!
//! ```no_run
//! use agent_rewind::config::LoggingConfig;
//! use agent_rewind::observability::init_tracing;
//!
//! init_tracing(&LoggingConfig::default()).unwrap();
//! tracing::info!("checkpoints ready");
//! ```

pub mod subscriber;

// Re-export main types for convenience
pub use subscriber::{build_filter, init_tracing};
