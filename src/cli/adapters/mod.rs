//! Adapter traits for CLI commands
//!
//! These traits define minimal, stable interfaces between the checkpoint
//! commands and host applications. Implementing them lets an agent use the
//! commands without tight coupling.

pub mod context;
pub mod session;

pub use context::CommandContext;
pub use session::SessionAccess;
