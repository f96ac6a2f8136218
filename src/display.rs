//! Colored terminal output for builds.
//!
//! Everything goes to stdout except errors of the tool itself. Blocks without
//! a location are echoed verbatim, tagged with the pipe they came from.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::output::{Diagnostic, Origin, Progress, Severity};
use crate::process::{BuildOutcome, Invocation};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// 1-based `file:line:col`, plus the last underlined column when the
/// underline spans several columns.
#[must_use]
pub fn format_location(diagnostic: &Diagnostic) -> String {
    let mut location = format!(
        "{}:{}:{}",
        diagnostic.file.display(),
        diagnostic.line + 1,
        diagnostic.column + 1
    );
    if diagnostic.underline_len() > 1 {
        location.push_str(&format!("-{}", diagnostic.end_column));
    }
    location
}

/// Print the command about to run.
pub fn print_command(invocation: &Invocation) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[RUN]".blue().bold(),
        invocation.command_line().cyan()
    );
    let _ = io::stdout().flush();
}

/// Print a progress update.
pub fn print_progress(progress: Progress) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[PROGRESS]".blue().bold(),
        progress
    );
    let _ = io::stdout().flush();
}

/// Print a located diagnostic.
pub fn print_diagnostic(diagnostic: &Diagnostic) {
    let tag = match diagnostic.severity {
        Severity::Error => "[ERROR]".red().bold().to_string(),
        Severity::Warning => "[WARNING]".yellow().bold().to_string(),
    };
    println!(
        "{} {} {}",
        tag,
        format_location(diagnostic).bold(),
        diagnostic.source_label().dimmed()
    );
    for line in diagnostic.message.lines() {
        println!("    {line}");
    }
    let _ = io::stdout().flush();
}

/// The line printed for an unlocated block, or `None` for a blank one.
///
/// The text is kept in full apart from trailing whitespace.
#[must_use]
pub fn format_raw(origin: Origin, text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    Some(format!("{} {}", format!("[{origin}]").dimmed(), text.trim_end()))
}

/// Print an unlocated output block.
pub fn print_raw(origin: Origin, text: &str) {
    if let Some(line) = format_raw(origin, text) {
        println!("{line}");
        let _ = io::stdout().flush();
    }
}

/// Print the final outcome of a build.
pub fn print_outcome(outcome: BuildOutcome) {
    let ts = timestamp();
    let message = outcome.to_string();
    match outcome {
        BuildOutcome::Success => println!(
            "{} {} {}",
            ts.dimmed(),
            "[BUILD]".green().bold(),
            message.green()
        ),
        BuildOutcome::SourceErrors | BuildOutcome::ToolFailure { .. } => println!(
            "{} {} {}",
            ts.dimmed(),
            "[BUILD]".red().bold(),
            message.red()
        ),
        BuildOutcome::Interrupted => println!(
            "{} {} {}",
            ts.dimmed(),
            "[BUILD]".yellow().bold(),
            message.yellow()
        ),
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}
