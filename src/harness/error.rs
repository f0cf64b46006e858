use thiserror::Error;

/// Errors that stop the harness itself, as opposed to failures of the API
/// under test (which are recorded in step results).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("Step '{step}' references context slot '{slot}', which no earlier step set")]
    MissingContextSlot { slot: String, step: String },

    #[error("Invalid run state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),
}
