//! Run state machine.

use super::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a workflow run.
///
/// `Pending -> Running(0) -> ... -> Running(n-1) -> Completed`, or a jump
/// from `Running(i)` to `Aborted(i)` / `InfrastructureFailure(i)`. Terminal
/// states never change again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Pending,
    Running { step: usize },
    Completed,
    /// Step `step` failed an assertion under abort-remaining.
    Aborted { step: usize },
    /// Step `step` got no usable response.
    InfrastructureFailure { step: usize },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed
                | RunState::Aborted { .. }
                | RunState::InfrastructureFailure { .. }
        )
    }

    /// Moves to `next`, rejecting edges the machine does not have.
    pub fn transition(&mut self, next: RunState) -> Result<(), HarnessError> {
        let allowed = match (*self, next) {
            (RunState::Pending, RunState::Running { step: 0 }) => true,
            (RunState::Pending, RunState::Completed) => true,
            (RunState::Running { step }, RunState::Running { step: n }) => n == step + 1,
            (RunState::Running { .. }, RunState::Completed) => true,
            (RunState::Running { step }, RunState::Aborted { step: s })
            | (RunState::Running { step }, RunState::InfrastructureFailure { step: s }) => {
                s == step
            }
            _ => false,
        };

        if !allowed {
            return Err(HarnessError::InvalidStateTransition(format!(
                "{} -> {}",
                self, next
            )));
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Pending => f.write_str("pending"),
            RunState::Running { step } => write!(f, "running({})", step),
            RunState::Completed => f.write_str("completed"),
            RunState::Aborted { step } => write!(f, "aborted({})", step),
            RunState::InfrastructureFailure { step } => {
                write!(f, "infrastructure_failure({})", step)
            }
        }
    }
}
