//! Run state machine.

use serde::{Deserialize, Serialize};

use crate::output::Severity;

/// Lifecycle of one supervised build tool process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Spawning,
    Running,
    Cancelling,
    Exited,
}

/// State machine for tracking a run's progress.
#[derive(Debug, Clone)]
pub struct RunStateMachine {
    state: RunState,
    blocks: usize,
    warnings: usize,
    errors: usize,
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RunState::Spawning,
            blocks: 0,
            warnings: 0,
            errors: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn transition(&mut self, new_state: RunState) {
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }

    pub fn record_block(&mut self) {
        self.blocks = self.blocks.saturating_add(1);
    }

    pub fn record_diagnostic(&mut self, severity: Severity) {
        match severity {
            Severity::Warning => self.warnings = self.warnings.saturating_add(1),
            Severity::Error => self.errors = self.errors.saturating_add(1),
        }
    }

    /// Whether an error diagnostic has been seen. Never resets.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.errors > 0
    }

    #[must_use]
    pub fn stats(&self) -> RunStats {
        RunStats {
            blocks: self.blocks,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

/// Run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub blocks: usize,
    pub warnings: usize,
    pub errors: usize,
}
