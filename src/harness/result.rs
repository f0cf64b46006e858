//! Per-step outcomes.

use super::expect::AssertionFailure;
use crate::client::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    /// The API answered but the answer was wrong.
    AssertionFailed { failures: Vec<AssertionFailure> },
    /// No usable answer: connection refused, timeout, or a body that was
    /// expected to be JSON and was not.
    InfrastructureFailure { reason: String },
    /// Skipped because an earlier step aborted the run.
    NotRun,
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Verdict::AssertionFailed { .. } | Verdict::InfrastructureFailure { .. }
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => f.write_str("PASS"),
            Verdict::AssertionFailed { .. } => f.write_str("FAIL"),
            Verdict::InfrastructureFailure { .. } => f.write_str("ERROR"),
            Verdict::NotRun => f.write_str("SKIP"),
        }
    }
}

/// One response of a fan-out step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub index: usize,
    pub status: u16,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Record of one executed (or skipped) step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub label: String,
    pub method: HttpMethod,
    /// Rendered path, or the template when the step never ran.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(flatten)]
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fan_out: Vec<ProbeOutcome>,
}

impl StepResult {
    pub fn not_run(
        index: usize,
        label: impl Into<String>,
        method: HttpMethod,
        path: impl Into<String>,
    ) -> Self {
        Self {
            index,
            label: label.into(),
            method,
            path: path.into(),
            status: None,
            body: None,
            verdict: Verdict::NotRun,
            warnings: Vec::new(),
            elapsed_ms: 0,
            fan_out: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict.is_passed()
    }

    /// One line per failure reason, for reports.
    pub fn failure_lines(&self) -> Vec<String> {
        match &self.verdict {
            Verdict::AssertionFailed { failures } => {
                failures.iter().map(|f| f.to_string()).collect()
            }
            Verdict::InfrastructureFailure { reason } => vec![reason.clone()],
            _ => Vec::new(),
        }
    }
}
