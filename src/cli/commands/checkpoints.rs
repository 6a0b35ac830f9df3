//! Checkpoint commands
//!
//! Save, list, restore, undo, redo and clear checkpoints of the running
//! agent session. Commands can come from a clap-based binary or from
//! slash-commands typed at the agent prompt.

use crate::checkpoint::{CheckpointError, CheckpointId, CheckpointManager, ErrorKind};
use crate::cli::adapters::{CommandContext, SessionAccess};
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::checkpoint_table;
use clap::{Parser, Subcommand};

/// Checkpoint subcommands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CheckpointCommand {
    /// Save a checkpoint of the current session and project files
    Save {
        /// Snapshot files even if nothing changed
        #[arg(long)]
        force: bool,
        /// Label for the checkpoint; defaults to the last prompt
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List checkpoints
    List {
        /// Show a detailed table
        #[arg(short, long)]
        verbose: bool,
        /// Print summaries as JSON
        #[arg(long, conflicts_with = "verbose")]
        json: bool,
    },
    /// Restore project files and session to a checkpoint
    Restore {
        /// Checkpoint number, e.g. 3 or #3
        id: String,
    },
    /// Go back to the previous checkpoint
    Undo,
    /// Re-apply the most recently undone checkpoint
    Redo,
    /// Forget all checkpoints of this session
    Clear {
        /// Also forget where the snapshot store lives
        #[arg(long)]
        reset_store: bool,
    },
}

#[derive(Debug, Parser)]
#[command(name = "checkpoint", no_binary_name = true, disable_help_subcommand = true)]
struct SlashCommand {
    #[command(subcommand)]
    command: CheckpointCommand,
}

/// Parse a prompt line such as `/undo` or `/checkpoint list -v`.
///
/// Returns `None` when the line is not a checkpoint command.
pub fn parse_slash_command(line: &str) -> Option<CliResult<CheckpointCommand>> {
    let mut words = line.trim().strip_prefix('/')?.split_whitespace().peekable();
    match words.peek().copied() {
        Some("checkpoint") | Some("checkpoints") => {
            words.next();
        }
        Some("undo") | Some("redo") => {}
        _ => return None,
    }
    Some(
        SlashCommand::try_parse_from(words)
            .map(|parsed| parsed.command)
            .map_err(|e| CliError::InvalidInput(e.to_string())),
    )
}

/// Run one checkpoint command against the session and its manager
pub async fn run_checkpoint_command<C, S>(
    ctx: &C,
    session: &mut S,
    manager: &mut CheckpointManager,
    command: CheckpointCommand,
) -> CliResult<()>
where
    C: CommandContext + ?Sized,
    S: SessionAccess + ?Sized,
{
    let result = match command {
        CheckpointCommand::Save { force, message } => {
            save(ctx, session, manager, force, message).await
        }
        CheckpointCommand::List { verbose, json } => list(ctx, manager, verbose, json),
        CheckpointCommand::Restore { id } => restore(ctx, session, manager, &id).await,
        CheckpointCommand::Undo => undo(ctx, session, manager).await,
        CheckpointCommand::Redo => redo(ctx, session, manager).await,
        CheckpointCommand::Clear { reset_store } => {
            let count = manager.history().len();
            manager.clear_checkpoints(reset_store);
            ctx.log_success(&format!("Cleared {} checkpoint(s)", count));
            Ok(())
        }
    };

    match result {
        // Hitting either end of the history is not a failure
        Err(CliError::Checkpoint(e)) if e.kind() == ErrorKind::Boundary => {
            ctx.log_warn(&e.user_friendly_message());
            Ok(())
        }
        other => other,
    }
}

async fn save<C, S>(
    ctx: &C,
    session: &mut S,
    manager: &mut CheckpointManager,
    force: bool,
    message: Option<String>,
) -> CliResult<()>
where
    C: CommandContext + ?Sized,
    S: SessionAccess + ?Sized,
{
    let input = message.unwrap_or_else(|| session.last_user_input());
    let outcome = manager
        .add_checkpoint(session.agent_state()?, session.last_tool_results()?, input, force)
        .await?;

    if outcome.created {
        ctx.log_success(&format!("Saved checkpoint #{}", outcome.checkpoint.id));
    } else {
        ctx.log_info(&format!(
            "No changes since checkpoint #{}",
            outcome.checkpoint.id
        ));
    }
    Ok(())
}

fn list<C>(ctx: &C, manager: &CheckpointManager, verbose: bool, json: bool) -> CliResult<()>
where
    C: CommandContext + ?Sized,
{
    if json {
        let summaries = manager.list_checkpoints();
        ctx.log_info(&serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let checkpoints = manager.list_checkpoints();
    if verbose && !manager.is_disabled() && !checkpoints.is_empty() {
        let mut table = checkpoint_table(&checkpoints, manager.config().preview_chars);
        table.set_width(ctx.terminal_width() as u16);
        ctx.log_info(&table.to_string());
    } else {
        ctx.log_info(&manager.format_history());
    }
    Ok(())
}

async fn restore<C, S>(
    ctx: &C,
    session: &mut S,
    manager: &mut CheckpointManager,
    raw_id: &str,
) -> CliResult<()>
where
    C: CommandContext + ?Sized,
    S: SessionAccess + ?Sized,
{
    let id = CheckpointId::parse(raw_id)
        .ok_or_else(|| CliError::InvalidInput(format!("not a checkpoint number: {}", raw_id)))?;

    let checkpoint = manager.restore_checkpoint_file_state(id, true).await?;
    session.restore_agent_state(&checkpoint.agent_state, &checkpoint.last_tool_results)?;
    ctx.log_success(&format!("Restored checkpoint #{}", checkpoint.id));
    Ok(())
}

async fn undo<C, S>(ctx: &C, session: &mut S, manager: &mut CheckpointManager) -> CliResult<()>
where
    C: CommandContext + ?Sized,
    S: SessionAccess + ?Sized,
{
    let outcome = manager.undo().await?;
    session.restore_agent_state(
        &outcome.restored.agent_state,
        &outcome.restored.last_tool_results,
    )?;
    session.set_prompt(&outcome.undone_input);
    ctx.log_success(&format!(
        "Undone. Now at checkpoint #{}",
        outcome.restored.id
    ));
    Ok(())
}

async fn redo<C, S>(ctx: &C, session: &mut S, manager: &mut CheckpointManager) -> CliResult<()>
where
    C: CommandContext + ?Sized,
    S: SessionAccess + ?Sized,
{
    let checkpoint = manager.redo().await?;
    session.restore_agent_state(&checkpoint.agent_state, &checkpoint.last_tool_results)?;
    ctx.log_success(&format!("Redone. Now at checkpoint #{}", checkpoint.id));
    Ok(())
}

/// True for errors the user can fix by trying again
pub fn is_transient(error: &CliError) -> bool {
    matches!(error, CliError::Checkpoint(e) if e.is_retryable())
}

/// The disablement behind an error, if any
pub fn disabled_error(error: &CliError) -> Option<&CheckpointError> {
    match error {
        CliError::Checkpoint(e) if e.kind() == ErrorKind::Disabled => Some(e),
        _ => None,
    }
}
