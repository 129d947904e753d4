//! Terminal rendering for confirmation prompts and run outcomes.

use crate::types::{Action, ExitStatus, RunOutcome};
use crossterm::style::{Color, Stylize};

/// Format command text as a shell snippet block for the confirmation prompt.
pub fn format_command_block(command: &str) -> String {
    if command.trim().is_empty() {
        return "$".to_string();
    }

    let mut out = String::new();
    for (idx, line) in command.lines().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        if idx == 0 {
            out.push_str("$ ");
        } else {
            out.push_str("  ");
        }
        out.push_str(line);
    }
    out
}

/// Print the pending command and working directory to stderr.
pub fn print_confirm_request(color: bool, action: &Action) {
    let location = action.working_directory.display().to_string();
    if color {
        eprintln!(
            "{} pending shell command in {}",
            "•".with(Color::DarkGrey),
            location.as_str().with(Color::White)
        );
    } else {
        eprintln!("• pending shell command in {location}");
    }
    eprintln!("{}", format_command_block(&action.command));
    eprint!("  run? [enter=yes, text=reject with note, q=abort] ");
}

/// Print the final `(status, result)` pair.
pub fn print_outcome(color: bool, outcome: &RunOutcome) {
    let label = outcome.exit_status.as_str();
    if color {
        let styled = match outcome.exit_status {
            ExitStatus::Submitted => label.with(Color::Green),
            ExitStatus::Exhausted | ExitStatus::Cancelled => label.with(Color::Yellow),
            ExitStatus::ModelError | ExitStatus::EnvironmentError => label.with(Color::Red),
        };
        eprintln!("{} {}", "•".with(Color::DarkGrey), styled.bold());
    } else {
        eprintln!("• {label}");
    }
    if !outcome.result.is_empty() {
        println!("{}", outcome.result);
    }
}
