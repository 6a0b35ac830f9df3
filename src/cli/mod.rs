//! CLI feature - Checkpoint commands for agent command lines
//!
//! This module provides checkpoint command implementations that plug into
//! any agent through adapter traits.
//!
//! # Architecture
//!
//! Commands interact with the host application through adapter traits:
//! - `CommandContext` - Where messages go
//! - `SessionAccess` - The live agent session (state in, state out, prompt)
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_rewind::cli::{parse_slash_command, run_checkpoint_command};
//!
//! if let Some(command) = parse_slash_command(&line) {
//!     run_checkpoint_command(&ctx, &mut session, &mut manager, command?).await?;
//! }
//! ```

pub mod adapters;
pub mod commands;
pub mod error;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

// Re-exports for convenience
pub use adapters::{CommandContext, SessionAccess};
pub use commands::{
    disabled_error, is_transient, parse_slash_command, run_checkpoint_command, CheckpointCommand,
};
pub use error::{CliError, CliResult};
pub use utils::{checkpoint_table, display_error_with_suggestions, file_state_label};
