//! Build tool strategies.
//!
//! A [`Builder`] turns a [`BuildCommand`] and [`BuildOptions`] into the
//! ordered invocations of one build, and a [`BuildSession`] runs them one
//! after another under a single cancellation token.

mod cabal;
mod session;
mod stack;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::BuildConfig;
use crate::process::{Invocation, SpawnOptions};
use crate::project::TargetSelection;

pub use cabal::{HPACK_MANIFEST, VERB_PREFIX};
pub use session::*;
pub use stack::{LIBRARY_TARGET, NO_RUN_BENCHMARKS, NO_RUN_TESTS};

/// Command requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildCommand {
    Build,
    Test,
    Bench,
    Clean,
}

impl BuildCommand {
    /// Verb passed to the build tool.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::Bench => "bench",
            Self::Clean => "clean",
        }
    }
}

impl std::fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}

/// Build tool in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Builder {
    /// `cabal v2-*` commands, with an optional hpack pre-step.
    CabalV2,
    /// `stack` commands.
    Stack,
    /// Run nothing.
    None,
}

impl Builder {
    /// Name used in configuration files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CabalV2 => "cabal-v2",
            Self::Stack => "stack",
            Self::None => "none",
        }
    }

    /// Invocations needed to run `command`, in order.
    pub async fn plan(self, command: BuildCommand, options: &BuildOptions) -> Vec<Step> {
        match self {
            Self::CabalV2 => cabal::plan(command, options).await,
            Self::Stack => vec![Step::main(stack::invocation(command, options))],
            Self::None => Vec::new(),
        }
    }

    /// Plan `command` and return a session ready to run it.
    pub async fn start(
        self,
        command: BuildCommand,
        options: &BuildOptions,
        cancel: CancellationToken,
    ) -> BuildSession {
        let steps = self.plan(command, options).await;
        tracing::info!(
            builder = self.name(),
            %command,
            steps = steps.len(),
            "Starting build"
        );
        BuildSession::new(steps, options.spawn.clone(), cancel)
    }
}

impl std::fmt::Display for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a builder needs for one build, fixed when the build starts.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Project root; the build tool runs here.
    pub root: PathBuf,
    pub target: TargetSelection,
    pub config: BuildConfig,
    pub spawn: SpawnOptions,
}

impl BuildOptions {
    /// Options running in `root` with the inherited environment.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, target: TargetSelection, config: BuildConfig) -> Self {
        let root = root.into();
        let spawn = SpawnOptions::for_project(root.clone());
        Self {
            root,
            target,
            config,
            spawn,
        }
    }
}

/// Role of an invocation within a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Preparation whose failure aborts the build.
    Prepare,
    /// The requested command itself.
    Main,
}

/// One planned invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub invocation: Invocation,
}

impl Step {
    #[must_use]
    pub fn prepare(invocation: Invocation) -> Self {
        Self {
            kind: StepKind::Prepare,
            invocation,
        }
    }

    #[must_use]
    pub fn main(invocation: Invocation) -> Self {
        Self {
            kind: StepKind::Main,
            invocation,
        }
    }
}
