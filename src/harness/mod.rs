//! Workflow-driven API test harness.
//!
//! A [`Workflow`] is an ordered list of [`Step`]s. The [`WorkflowRunner`]
//! renders each step's request from the run's [`WorkflowContext`], sends it
//! through an [`ApiTransport`](crate::client::ApiTransport), checks the
//! response against the step's [`Expectation`]s and records a
//! [`StepResult`]. Finished runs go to one or more [`Reporter`]s.

mod context;
mod error;
mod expect;
mod path;
mod probe;
mod reporter;
mod result;
mod runner;
mod state;
mod step;
mod template;
mod workflow;

pub use context::{MissingSlot, WorkflowContext};
pub use error::HarnessError;
pub use expect::{AssertionFailure, Expectation, Expected, LengthPredicate};
pub use path::lookup;
pub use probe::{ConcurrencyProbe, ProbeResponse};
pub use reporter::{
    JsonReporter, Reporter, ResponseLoggingLevel, RunSummary, SummaryRow, TracingReporter,
};
pub use result::{ProbeOutcome, StepResult, Verdict};
pub use runner::{FailurePolicy, WorkflowRun, WorkflowRunner};
pub use state::RunState;
pub use step::{Auth, BodyTemplate, Capture, ContextUpdate, RequestTemplate, Step, StepAction};
pub use template::{placeholders, render_str, render_value};
pub use workflow::Workflow;
