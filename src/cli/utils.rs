//! Shared utility functions for CLI commands

use crate::checkpoint::formatter::truncate_to_width;
use crate::checkpoint::{CheckpointSummary, FileState};
use crate::cli::error::CliError;
use colored::*;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

/// Display a user-friendly error message with suggestions
pub fn display_error_with_suggestions(error: &CliError, app_name: Option<&str>) {
    let app = app_name.unwrap_or("agent");

    eprintln!("{} {}", "❌ Error:".red().bold(), error.user_friendly_message().red());

    let error_str = error.to_string().to_lowercase();
    if error_str.contains("timed out") || error_str.contains("worker exited") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Run the command again; the snapshot store may have been busy");
        eprintln!("   • Check that no other git process holds a lock in the store");
    } else if error_str.contains("not found") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Run '{} checkpoint list' to see available checkpoints", app);
    } else if error_str.contains("disabled") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Checkpoints stay off until the session restarts");
    }
}

/// Short label for a checkpoint's file snapshot state
pub fn file_state_label(state: &FileState) -> String {
    match state {
        FileState::Pending => "pending".to_string(),
        FileState::Resolved(commit) => commit.short().to_string(),
        FileState::Failed(_) => "failed".to_string(),
    }
}

/// Build the detailed checkpoint table used by `list --verbose`
pub fn checkpoint_table(checkpoints: &[CheckpointSummary], preview_chars: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["", "#", "Parent", "Created", "Input", "Messages", "Snapshot"]);

    for checkpoint in checkpoints {
        let marker = if checkpoint.is_current {
            Cell::new("*").fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            Cell::new("")
        };
        let parent = checkpoint
            .parent_id
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let input = checkpoint.user_input.split_whitespace().collect::<Vec<_>>().join(" ");
        let snapshot = match &checkpoint.file_state {
            FileState::Failed(_) => Cell::new("failed").fg(Color::Red),
            state => Cell::new(file_state_label(state)),
        };

        table.add_row(vec![
            marker,
            Cell::new(checkpoint.id),
            Cell::new(parent),
            Cell::new(
                checkpoint
                    .created_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S"),
            ),
            Cell::new(truncate_to_width(&input, preview_chars)),
            Cell::new(checkpoint.history_length),
            snapshot,
        ]);
    }
    table
}
