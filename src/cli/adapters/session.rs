//! SessionAccess adapter trait
//!
//! The agent session owns the conversation. Checkpoint commands read the
//! serialized state out of it when saving and hand a checkpoint's state back
//! when moving through history.

use crate::cli::error::CliResult;

/// Access to the live agent session
pub trait SessionAccess {
    /// Serialized agent state to record in a new checkpoint
    fn agent_state(&self) -> CliResult<Vec<u8>>;

    /// Serialized results of the most recent tool calls
    fn last_tool_results(&self) -> CliResult<Vec<u8>> {
        Ok(Vec::new())
    }

    /// The prompt that led to the current state
    fn last_user_input(&self) -> String;

    /// Replace the live agent state with a checkpoint's
    fn restore_agent_state(&mut self, agent_state: &[u8], last_tool_results: &[u8])
        -> CliResult<()>;

    /// Pre-fill the input prompt, e.g. with an undone request
    fn set_prompt(&mut self, text: &str);
}
