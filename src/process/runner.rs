//! Supervision of one build tool process.
//!
//! A [`BuildRun`] owns the merged stdout/stderr block stream of a spawned
//! build tool and hands out parsed [`BuildEvent`]s one at a time. Output is
//! only read while the caller asks for the next event, so a slow consumer
//! holds the tool back instead of growing a buffer. The child handle itself
//! lives in a small exit watcher task that reaps the process and performs
//! the termination sequence when the cancellation token fires.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::ExitStatus;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::output::{
    block_stream, parse_message, parse_progress, Origin, OutputBlock, StreamMerger,
};
use crate::process::{
    spawn_child, BuildEvent, BuildResult, Invocation, RunState, RunStateMachine, RunStats,
    SpawnError, SpawnOptions,
};

/// A boxed source of message blocks from one pipe.
pub type BlockSource = Pin<Box<dyn Stream<Item = io::Result<OutputBlock>> + Send>>;

/// Error type for supervised runs.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    /// The build tool could not be launched.
    #[error("Failed to launch build tool: {0}")]
    Spawn(#[from] SpawnError),
    /// Process stdout was not available.
    #[error("Process stdout not available")]
    NoStdout,
    /// Process stderr was not available.
    #[error("Process stderr not available")]
    NoStderr,
    /// Waiting for the process failed.
    #[error("Failed to wait for build tool: {0}")]
    Wait(#[source] io::Error),
    /// The exit watcher went away without reporting.
    #[error("Exit watcher stopped before the process exited")]
    WatcherGone,
}

/// A running build tool invocation.
pub struct BuildRun {
    invocation: Invocation,
    base_dir: PathBuf,
    pid: Option<u32>,
    output: StreamMerger<BlockSource, BlockSource>,
    pending: VecDeque<BuildEvent>,
    exit: oneshot::Receiver<io::Result<ExitStatus>>,
    cancel: CancellationToken,
    state: RunStateMachine,
}

impl std::fmt::Debug for BuildRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildRun")
            .field("invocation", &self.invocation)
            .field("pid", &self.pid)
            .field("state", &self.state.state())
            .finish_non_exhaustive()
    }
}

impl BuildRun {
    /// Spawn `invocation` and start supervising it.
    ///
    /// Diagnostics with relative paths are resolved against the working
    /// directory in `options`. Cancelling `cancel` at any time terminates
    /// the process; after the process has exited it does nothing.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Spawn` if the executable cannot be launched.
    pub fn spawn(
        invocation: Invocation,
        options: &SpawnOptions,
        cancel: CancellationToken,
    ) -> Result<Self, RunError> {
        let mut state = RunStateMachine::new();
        let mut child = spawn_child(&invocation, options)?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.start_kill();
            return Err(RunError::NoStdout);
        };
        let Some(stderr) = child.stderr.take() else {
            let _ = child.start_kill();
            return Err(RunError::NoStderr);
        };

        let pid = child.id();
        tracing::info!(
            command = %invocation.command_line(),
            cwd = %options.cwd().display(),
            pid = ?pid,
            "Spawned build tool"
        );

        let stdout: BlockSource = Box::pin(block_stream(stdout, Origin::Stdout));
        let stderr: BlockSource = Box::pin(block_stream(stderr, Origin::Stderr));
        let exit = watch_exit(child, cancel.clone());
        state.transition(RunState::Running);

        Ok(Self {
            invocation,
            base_dir: options.cwd().to_path_buf(),
            pid,
            output: StreamMerger::new(stdout, stderr),
            pending: VecDeque::new(),
            exit,
            cancel,
            state,
        })
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once both output pipes are closed and every block has
    /// been handed out.
    pub async fn next_event(&mut self) -> Option<BuildEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            tokio::select! {
                biased;

                () = self.cancel.cancelled(), if self.state.state() == RunState::Running => {
                    tracing::info!(program = %self.invocation.program, "Build cancelled via token");
                    self.state.transition(RunState::Cancelling);
                }
                block = self.output.next() => {
                    let Some(block) = block else {
                        return None;
                    };
                    self.handle_block(block);
                }
            }
        }
    }

    /// Drain the remaining output and wait for the process to exit.
    ///
    /// Events not yet taken are discarded but still count towards
    /// `has_error`. The result is only produced after the process has
    /// actually exited, also when it was cancelled.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Wait` if the exit status cannot be collected.
    pub async fn finish(mut self) -> Result<BuildResult, RunError> {
        while self.next_event().await.is_some() {}

        if self.cancel.is_cancelled() && self.state.state() == RunState::Running {
            self.state.transition(RunState::Cancelling);
        }

        let status = (&mut self.exit)
            .await
            .map_err(|_| RunError::WatcherGone)?
            .map_err(RunError::Wait)?;
        self.state.transition(RunState::Exited);

        let result = BuildResult {
            exit_code: status.code(),
            has_error: self.state.has_error(),
        };
        let stats = self.state.stats();
        tracing::info!(
            program = %self.invocation.program,
            exit_code = ?result.exit_code,
            has_error = result.has_error,
            blocks = stats.blocks,
            warnings = stats.warnings,
            errors = stats.errors,
            "Build tool exited"
        );
        Ok(result)
    }

    fn handle_block(&mut self, block: OutputBlock) {
        self.state.record_block();

        if let Some(progress) = parse_progress(&block.text) {
            self.pending.push_back(BuildEvent::Progress(progress));
        }

        let diagnostic = parse_message(&block.text, &self.base_dir);
        if let Some(diag) = &diagnostic {
            self.state.record_diagnostic(diag.severity);
        }
        tracing::trace!(
            origin = %block.origin,
            located = diagnostic.is_some(),
            len = block.text.len(),
            "Output block"
        );

        self.pending.push_back(BuildEvent::Message {
            origin: block.origin,
            raw: block.text,
            diagnostic,
        });
    }

    /// The command being supervised.
    #[must_use]
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Directory relative diagnostic paths are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Process ID at spawn time.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state.state()
    }

    /// Whether an error diagnostic has been produced so far.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.state.has_error()
    }

    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.state.stats()
    }
}

/// Reap `child`, terminating it first if `cancel` fires while it runs.
fn watch_exit(
    mut child: Child,
    cancel: CancellationToken,
) -> oneshot::Receiver<io::Result<ExitStatus>> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let status = tokio::select! {
            biased;

            status = child.wait() => status,
            () = cancel.cancelled() => {
                terminate(&mut child);
                child.wait().await
            }
        };
        let _ = tx.send(status);
    });
    rx
}

/// Best-effort termination.
///
/// Signals the process group, then the process, then kills the child
/// directly. Every step is attempted regardless of the others.
fn terminate(child: &mut Child) {
    let pid = child.id();
    tracing::info!(pid = ?pid, "Terminating build tool");

    #[cfg(unix)]
    if let Some(pid) = pid {
        signal_unix(pid);
    }

    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "Direct kill failed");
    }
}

#[cfg(unix)]
fn signal_unix(pid: u32) {
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
    if let Err(e) = killpg(nix_pid, Signal::SIGTERM) {
        tracing::debug!(pid, error = %e, "Signalling process group failed");
    }
    if let Err(e) = kill(nix_pid, Signal::SIGTERM) {
        tracing::debug!(pid, error = %e, "Signalling process failed");
    }
}
