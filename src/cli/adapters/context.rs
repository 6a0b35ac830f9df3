//! CommandContext adapter trait
//!
//! Gives commands somewhere to report to without coupling them to a
//! particular terminal or UI.

use crate::cli::error::CliResult;

/// Output sink for CLI command execution
///
/// # Example
///
/// ```rust,ignore
/// use agent_rewind::cli::CommandContext;
///
/// struct Stdout;
///
/// impl CommandContext for Stdout {
///     fn log_info(&self, message: &str) {
///         println!("{}", message);
///     }
///
///     fn log_warn(&self, message: &str) {
///         eprintln!("warning: {}", message);
///     }
///
///     fn log_success(&self, message: &str) {
///         println!("✓ {}", message);
///     }
/// }
/// ```
pub trait CommandContext {
    /// Log an informational message
    fn log_info(&self, message: &str);

    /// Log a warning message
    fn log_warn(&self, message: &str);

    /// Log an error message
    fn log_error(&self, message: &str) -> CliResult<()> {
        self.log_warn(message);
        Ok(())
    }

    /// Log a success message
    fn log_success(&self, message: &str);

    /// Get terminal width for formatting
    fn terminal_width(&self) -> usize {
        80 // Default fallback
    }
}
