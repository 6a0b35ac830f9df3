//! Test utilities and mock implementations for CLI testing
//!
//! Provides mock adapter implementations for unit testing CLI commands
//! without requiring a real agent session.

pub mod mocks;

pub use mocks::{MockCommandContext, MockSession};
