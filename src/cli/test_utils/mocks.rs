//! Mock implementations of adapter traits for testing

use crate::cli::adapters::{CommandContext, SessionAccess};
use crate::cli::error::{CliError, CliResult};
use std::sync::{Arc, Mutex};

/// Mock implementation of CommandContext that records every message
#[derive(Clone, Default)]
pub struct MockCommandContext {
    pub logs: Arc<Mutex<Vec<String>>>,
}

impl MockCommandContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }

    fn push(&self, level: &str, message: &str) {
        self.logs.lock().unwrap().push(format!("[{}] {}", level, message));
    }
}

impl CommandContext for MockCommandContext {
    fn log_info(&self, message: &str) {
        self.push("INFO", message);
    }

    fn log_warn(&self, message: &str) {
        self.push("WARN", message);
    }

    fn log_error(&self, message: &str) -> CliResult<()> {
        self.push("ERROR", message);
        Ok(())
    }

    fn log_success(&self, message: &str) {
        self.push("SUCCESS", message);
    }
}

/// In-memory agent session with a JSON agent state
#[derive(Debug, Clone)]
pub struct MockSession {
    pub files: Vec<String>,
    pub messages: usize,
    pub last_input: String,
    pub restored: Vec<Vec<u8>>,
    pub prompt: Option<String>,
    pub fail_restore: bool,
}

impl MockSession {
    pub fn new(files: &[&str]) -> Self {
        Self {
            files: files.iter().map(|f| f.to_string()).collect(),
            messages: 2,
            last_input: "do something".to_string(),
            restored: Vec::new(),
            prompt: None,
            fail_restore: false,
        }
    }
}

impl SessionAccess for MockSession {
    fn agent_state(&self) -> CliResult<Vec<u8>> {
        let messages: Vec<_> = (0..self.messages).map(|i| serde_json::json!({ "n": i })).collect();
        Ok(serde_json::to_vec(&serde_json::json!({
            "messages": messages,
            "file_tree": self.files,
        }))?)
    }

    fn last_user_input(&self) -> String {
        self.last_input.clone()
    }

    fn restore_agent_state(
        &mut self,
        agent_state: &[u8],
        _last_tool_results: &[u8],
    ) -> CliResult<()> {
        if self.fail_restore {
            return Err(CliError::AdapterError("session is busy".to_string()));
        }
        self.restored.push(agent_state.to_vec());
        Ok(())
    }

    fn set_prompt(&mut self, text: &str) {
        self.prompt = Some(text.to_string());
    }
}
