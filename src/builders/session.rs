//! Sequencing of the invocations that make up one build.

use std::collections::VecDeque;

use tokio_util::sync::CancellationToken;

use super::{Step, StepKind};
use crate::process::{BuildEvent, BuildResult, BuildRun, RunError, SpawnOptions};
use crate::project::TargetError;

/// Error type for builds.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    /// A build tool process could not be run.
    #[error(transparent)]
    Run(#[from] RunError),
    /// The build target could not be resolved.
    #[error(transparent)]
    Target(#[from] TargetError),
}

struct ActiveStep {
    kind: StepKind,
    run: BuildRun,
}

/// One build in progress.
///
/// Steps run strictly one after another. Events of every step come out of
/// the same [`next_event`](Self::next_event) call in order. A preparation step
/// that does not exit with code 0 ends the build and its result becomes the
/// build's result.
pub struct BuildSession {
    steps: VecDeque<Step>,
    spawn: SpawnOptions,
    cancel: CancellationToken,
    current: Option<ActiveStep>,
    result: Option<BuildResult>,
}

impl std::fmt::Debug for BuildSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildSession")
            .field("remaining", &self.steps.len())
            .field("running", &self.current.as_ref().map(|s| s.run.invocation()))
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl BuildSession {
    #[must_use]
    pub fn new(steps: Vec<Step>, spawn: SpawnOptions, cancel: CancellationToken) -> Self {
        Self {
            steps: steps.into(),
            spawn,
            cancel,
            current: None,
            result: None,
        }
    }

    /// Steps not started yet, in run order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Wait for the next event of the build, starting steps as needed.
    ///
    /// Returns `Ok(None)` once every step has finished.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Run` if a step cannot be launched or reaped. The
    /// remaining steps are dropped.
    pub async fn next_event(&mut self) -> Result<Option<BuildEvent>, BuildError> {
        loop {
            if let Some(active) = self.current.as_mut() {
                if let Some(event) = active.run.next_event().await {
                    return Ok(Some(event));
                }
                if let Some(active) = self.current.take() {
                    self.complete(active).await?;
                }
                continue;
            }

            let Some(step) = self.steps.pop_front() else {
                return Ok(None);
            };

            if self.cancel.is_cancelled() {
                tracing::info!(
                    command = %step.invocation.command_line(),
                    "Build cancelled before step started"
                );
                self.steps.clear();
                self.result = Some(BuildResult {
                    exit_code: None,
                    has_error: self.result.is_some_and(|r| r.has_error),
                });
                return Ok(None);
            }

            match BuildRun::spawn(step.invocation, &self.spawn, self.cancel.clone()) {
                Ok(run) => {
                    self.current = Some(ActiveStep {
                        kind: step.kind,
                        run,
                    });
                }
                Err(e) => {
                    self.steps.clear();
                    return Err(e.into());
                }
            }
        }
    }

    async fn complete(&mut self, active: ActiveStep) -> Result<(), BuildError> {
        let program = active.run.invocation().program.clone();
        let result = match active.run.finish().await {
            Ok(result) => result,
            Err(e) => {
                self.steps.clear();
                return Err(e.into());
            }
        };
        self.result = Some(result);

        if active.kind == StepKind::Prepare && !result.succeeded() {
            tracing::warn!(
                %program,
                exit_code = ?result.exit_code,
                skipped = self.steps.len(),
                "Preparation step failed, skipping build"
            );
            self.steps.clear();
        }
        Ok(())
    }

    /// Whether an error diagnostic has been seen in any step so far.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.result.is_some_and(|r| r.has_error)
            || self.current.as_ref().is_some_and(|s| s.run.has_error())
    }

    /// Drain the build and return its result.
    ///
    /// A build with no steps succeeds without running anything.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Run` if a step cannot be launched or reaped.
    pub async fn finish(mut self) -> Result<BuildResult, BuildError> {
        while self.next_event().await?.is_some() {}
        Ok(self.result.unwrap_or_else(BuildResult::success))
    }
}
