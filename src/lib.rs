//! SpinWish API Harness Library
//!
//! Workflow-driven integration tests for the SpinWish music-request API.

pub mod client;
pub mod config;
pub mod harness;
pub mod identity;
pub mod workflows;

// Re-export commonly used types for convenience
pub use client::{ApiClient, ApiTransport};
pub use harness::{
    Expectation, FailurePolicy, HarnessError, RequestTemplate, RunState, Step, Workflow,
    WorkflowContext, WorkflowRun, WorkflowRunner,
};
pub use identity::{Identity, IdentityFactory, Role};
pub use workflows::{WorkflowCatalog, WorkflowSettings};
