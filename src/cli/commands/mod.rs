//! CLI command implementations
//!
//! Generic command implementations that work via adapter traits.

pub mod checkpoints;

pub use checkpoints::{
    disabled_error, is_transient, parse_slash_command, run_checkpoint_command, CheckpointCommand,
};
