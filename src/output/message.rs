//! Parsing of compiler message blocks into diagnostics.
//!
//! A block is one reassembled compiler message. Blocks that start with a
//! `file:line:col:` location are turned into a [`Diagnostic`]; everything else
//! is informational text. Progress counters (`[3 of 10]`) are extracted
//! independently of the diagnostic parse.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Label attached to every diagnostic produced by this crate.
pub const SOURCE_NAME: &str = "haskell-build";

/// Severity of a parsed diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Map the optional severity word of a message header.
    ///
    /// Only `warning` (any case) is a warning; any other word, or none at
    /// all, is an error.
    #[must_use]
    pub fn from_word(word: Option<&str>) -> Self {
        match word {
            Some(w) if w.eq_ignore_ascii_case("warning") => Self::Warning,
            _ => Self::Error,
        }
    }
}

/// A located compiler message.
///
/// Line and column numbers are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    /// Column just past the underlined span.
    pub end_column: u32,
    pub severity: Severity,
    /// Message body with the common indentation removed.
    pub message: String,
    /// Bracketed context from the header, e.g. `[-Wunused-matches]`.
    pub context: Option<String>,
}

impl Diagnostic {
    /// Label naming where the diagnostic came from.
    #[must_use]
    pub fn source_label(&self) -> String {
        match &self.context {
            Some(context) => format!("{SOURCE_NAME}: {context}"),
            None => SOURCE_NAME.to_string(),
        }
    }

    /// Width of the underlined span.
    #[must_use]
    pub fn underline_len(&self) -> u32 {
        self.end_column - self.column
    }
}

/// Build progress reported by a `[N of M]` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {}", self.completed, self.total)
    }
}

fn location_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(.+):(\d+):(\d+):(?:[ \t]+(\w+):)?[ \t]*(\[[^\]]+\])?[ \t]*\n?([\s\S]*)$")
            .expect("location regex is valid")
    })
}

fn progress_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\[\s*(\d+)\s+of\s+(\d+)\s*\]").expect("progress regex is valid")
    })
}

fn excerpt_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[\s\d]*\|").expect("excerpt regex is valid"))
}

fn caret_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\^+").expect("caret regex is valid"))
}

/// Whether `line` belongs to a source excerpt (`12 | code`, `   |   ^^`).
#[must_use]
pub fn is_excerpt_line(line: &str) -> bool {
    excerpt_regex().is_match(line)
}

/// Parse a message block into a diagnostic.
///
/// Returns `None` for blank blocks and for blocks without a leading
/// `file:line:col:` location. Relative paths are resolved against `base_dir`.
#[must_use]
pub fn parse_message(block: &str, base_dir: &Path) -> Option<Diagnostic> {
    if block.trim().is_empty() {
        return None;
    }
    let caps = location_regex().captures(block.trim_end())?;

    let file = &caps[1];
    let line = caps[2].parse::<u32>().ok()?.saturating_sub(1);
    let column = caps[3].parse::<u32>().ok()?.saturating_sub(1);
    let severity = Severity::from_word(caps.get(4).map(|m| m.as_str()));
    let context = caps.get(5).map(|m| m.as_str().to_string());

    let mut body: Vec<&str> = caps[6].split('\n').collect();
    let mut excerpt = Vec::new();
    while let Some(last) = body.last() {
        if is_excerpt_line(last) {
            excerpt.push(*last);
            body.pop();
        } else {
            break;
        }
    }

    let width = excerpt
        .iter()
        .flat_map(|line| caret_regex().find_iter(line))
        .map(|m| m.as_str().len())
        .max()
        .unwrap_or(1);
    let width = u32::try_from(width).unwrap_or(u32::MAX);

    let path = Path::new(file);
    let file = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };

    Some(Diagnostic {
        file,
        line,
        column,
        end_column: column.saturating_add(width),
        severity,
        message: unindent(&body),
        context,
    })
}

/// Extract a `[N of M]` progress counter from anywhere in the block.
#[must_use]
pub fn parse_progress(block: &str) -> Option<Progress> {
    let caps = progress_regex().captures(block)?;
    Some(Progress {
        completed: caps[1].parse().ok()?,
        total: caps[2].parse().ok()?,
    })
}

/// Strip the indentation shared by every line. Blank lines count, so a
/// body containing one keeps its indentation.
fn unindent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}
