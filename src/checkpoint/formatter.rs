//! Plain-text rendering of checkpoint history

use super::config::{CheckpointConfig, DEFAULT_PREVIEW_CHARS};
use super::guard::DisabledReason;
use super::models::CheckpointSummary;
use chrono::Local;
use std::fmt::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Message shown when there is nothing to list
pub const EMPTY_HISTORY: &str = "No checkpoints available.";

/// Display options for [`format_history`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Maximum display width of the user input column
    pub preview_chars: usize,
    pub show_message_counts: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
            show_message_counts: true,
        }
    }
}

impl From<&CheckpointConfig> for FormatOptions {
    fn from(config: &CheckpointConfig) -> Self {
        Self {
            preview_chars: config.preview_chars,
            show_message_counts: config.show_message_counts,
        }
    }
}

/// Render the history, one line per checkpoint, current one marked with `*`
pub fn format_history(
    checkpoints: &[CheckpointSummary],
    disabled: Option<&DisabledReason>,
    options: &FormatOptions,
) -> String {
    if let Some(reason) = disabled {
        return format!("Checkpoints disabled: {}", reason);
    }
    if checkpoints.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    let mut out = String::new();
    match checkpoints.iter().find(|c| c.is_current) {
        Some(current) => {
            let _ = writeln!(out, "Checkpoints (current: #{})", current.id);
        }
        None => {
            let _ = writeln!(out, "Checkpoints");
        }
    }

    for checkpoint in checkpoints {
        let marker = if checkpoint.is_current { '*' } else { ' ' };
        let timestamp = checkpoint
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        let _ = write!(
            out,
            "{} #{:<3} {}  {}",
            marker,
            checkpoint.id,
            timestamp,
            preview(&checkpoint.user_input, options.preview_chars)
        );
        if options.show_message_counts {
            let _ = write!(out, "  ({} messages)", checkpoint.history_length);
        }
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    out
}

/// Collapse `text` to one line and cut it to `max_width` display columns
pub fn preview(text: &str, max_width: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.is_empty() {
        return "(no input)".to_string();
    }
    truncate_to_width(&line, max_width)
}

/// Cut `text` to at most `max_width` display columns, ending in `…` when cut
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut width = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}
