//! Build tool process spawning.
//!
//! This module describes one external invocation and the environment it runs
//! in, and launches it with piped output in its own process group.

use std::borrow::Cow;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

/// Separator between entries of `PATH`.
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";
/// Separator between entries of `PATH`.
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = ":";

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The executable was not found.
    #[error("{program}: executable not found")]
    NotFound { program: String },
    /// Permission denied when spawning.
    #[error("{program}: permission denied")]
    PermissionDenied { program: String },
    /// Other I/O error.
    #[error("{program}: {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(program: &str, err: std::io::Error) -> Self {
        let program = program.to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { program },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { program },
            _ => Self::Io {
                program,
                source: err,
            },
        }
    }
}

/// One external command: executable plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Shell-escaped command line, for logs and display.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| shell_escape::escape(Cow::Borrowed(part.as_str())).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Where and with which environment a build tool runs.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// Working directory, normally the project root.
    pub cwd: PathBuf,
    /// Complete environment of the child.
    pub env: Vec<(OsString, OsString)>,
}

impl SpawnOptions {
    /// Options for running in `root` with the inherited environment.
    #[must_use]
    pub fn for_project(root: impl Into<PathBuf>) -> Self {
        Self {
            cwd: root.into(),
            env: inherited_env(),
        }
    }

    /// Working directory of the child.
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

/// The current process environment, with `PATH` rebuilt on Windows.
///
/// Windows environment names are case-insensitive, so several spellings of
/// `PATH` can coexist and the wrong one may win. All spellings found are
/// joined into a single `PATH`.
#[must_use]
pub fn inherited_env() -> Vec<(OsString, OsString)> {
    let mut env: Vec<(OsString, OsString)> = std::env::vars_os().collect();
    if cfg!(windows) {
        let by_name: HashMap<String, String> = env
            .iter()
            .filter_map(|(k, v)| Some((k.to_str()?.to_string(), v.to_str()?.to_string())))
            .collect();
        let path = collect_path_capitalizations(|name| by_name.get(name).cloned());
        env.retain(|(k, _)| !k.to_str().is_some_and(|k| k.eq_ignore_ascii_case("path")));
        env.push((OsString::from("PATH"), OsString::from(path.join(PATH_SEPARATOR))));
    }
    env
}

/// Spell `name` with the characters selected by `mask` upper-cased.
///
/// Bit `i` of the mask selects the `i`-th character counted from the end.
#[must_use]
pub fn capitalize(name: &str, mask: u32) -> String {
    let len = name.chars().count();
    name.chars()
        .enumerate()
        .map(|(j, c)| {
            let bit = len - j - 1;
            if bit < 32 && mask & (1 << bit) != 0 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// Collect the values of every spelling of `PATH`.
///
/// Spellings are probed from mask `0` (`path`) up to mask `15` (`PATH`).
pub fn collect_path_capitalizations<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    (0..=0b1111)
        .filter_map(|mask| lookup(&capitalize("path", mask)))
        .collect()
}

/// Launch `invocation` with piped output.
///
/// On Unix the child leads its own process group so that cancellation can
/// signal every process the build tool started.
///
/// # Errors
///
/// Returns `SpawnError` if the executable cannot be launched.
pub fn spawn_child(invocation: &Invocation, options: &SpawnOptions) -> Result<Child, SpawnError> {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .current_dir(&options.cwd)
        .env_clear()
        .envs(options.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn()
        .map_err(|e| SpawnError::from_io(&invocation.program, e))
}
