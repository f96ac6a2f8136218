//! Events and results of a supervised build.

use serde::{Deserialize, Serialize};

use crate::output::{Diagnostic, Origin, Progress, Severity};

/// Something a running build tool reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// A `[N of M]` counter was seen.
    Progress(Progress),
    /// One message block, with its diagnostic when it has a location.
    Message {
        /// Pipe the block was read from.
        origin: Origin,
        /// Block text, verbatim.
        raw: String,
        diagnostic: Option<Diagnostic>,
    },
}

impl BuildEvent {
    /// Returns the diagnostic if this is a located message.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Message { diagnostic, .. } => diagnostic.as_ref(),
            Self::Progress(_) => None,
        }
    }

    /// Returns true if this message carries an error diagnostic.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.diagnostic()
            .is_some_and(|d| d.severity == Severity::Error)
    }
}

/// Final result of one build tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Whether any error diagnostic was reported.
    pub has_error: bool,
}

impl BuildResult {
    /// Result of a step that ran nothing.
    #[must_use]
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            has_error: false,
        }
    }

    /// Whether the tool exited with code 0.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Classify the result for reporting.
    #[must_use]
    pub fn outcome(&self) -> BuildOutcome {
        match self.exit_code {
            None => BuildOutcome::Interrupted,
            Some(0) => BuildOutcome::Success,
            Some(_) if self.has_error => BuildOutcome::SourceErrors,
            Some(exit_code) => BuildOutcome::ToolFailure { exit_code },
        }
    }
}

/// How a finished build should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    /// Non-zero exit explained by error diagnostics in the sources.
    SourceErrors,
    /// Non-zero exit without any error diagnostic.
    ToolFailure { exit_code: i32 },
    /// The process was terminated before it could finish.
    Interrupted,
}

impl std::fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("Build finished"),
            Self::SourceErrors => f.write_str("Build failed with errors in source"),
            Self::ToolFailure { exit_code } => {
                write!(f, "Builder quit abnormally with exit code {exit_code}")
            }
            Self::Interrupted => f.write_str("Build interrupted"),
        }
    }
}
