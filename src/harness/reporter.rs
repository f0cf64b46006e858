//! Run reporting: tracing events, a JSON report file and the final summary.

use super::result::{StepResult, Verdict};
use super::runner::WorkflowRun;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Receives every finished run.
pub trait Reporter: Send + Sync {
    fn report(&self, run: &WorkflowRun);
}

/// How much of each response the tracing reporter prints.
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug, clap::ValueEnum)]
pub enum ResponseLoggingLevel {
    None,
    Status,
    Body,
}

impl Default for ResponseLoggingLevel {
    fn default() -> Self {
        Self::Status
    }
}

impl std::fmt::Display for ResponseLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

const MAX_LOGGABLE_BODY_LENGTH: usize = 1024;

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &s[..end], s.len())
}

/// Logs each step and the run outcome as tracing events.
pub struct TracingReporter {
    level: ResponseLoggingLevel,
}

impl TracingReporter {
    pub fn new(level: ResponseLoggingLevel) -> Self {
        Self { level }
    }

    fn report_step(&self, workflow: &str, step: &StepResult) {
        let status = step
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        match &step.verdict {
            Verdict::Passed => {
                if self.level > ResponseLoggingLevel::None {
                    info!(
                        "[{}] #{} {} {} {} -> {} ({}ms) {}",
                        workflow,
                        step.index,
                        step.label,
                        step.method,
                        step.path,
                        status,
                        step.elapsed_ms,
                        step.verdict
                    );
                }
            }
            Verdict::NotRun => {
                if self.level > ResponseLoggingLevel::None {
                    info!("[{}] #{} {} {}", workflow, step.index, step.label, step.verdict);
                }
            }
            Verdict::AssertionFailed { .. } | Verdict::InfrastructureFailure { .. } => {
                error!(
                    "[{}] #{} {} {} {} -> {} ({}ms) {}",
                    workflow,
                    step.index,
                    step.label,
                    step.method,
                    step.path,
                    status,
                    step.elapsed_ms,
                    step.verdict
                );
                for line in step.failure_lines() {
                    error!("[{}]     {}", workflow, line);
                }
            }
        }

        for warning in &step.warnings {
            warn!("[{}]     warning: {}", workflow, warning);
        }

        for outcome in &step.fan_out {
            if self.level > ResponseLoggingLevel::None {
                info!(
                    "[{}]     fan-out #{} -> {} ({}ms)",
                    workflow, outcome.index, outcome.status, outcome.elapsed_ms
                );
            }
        }

        if self.level >= ResponseLoggingLevel::Body {
            if let Some(body) = &step.body {
                info!(
                    "[{}]     body: {}",
                    workflow,
                    truncate(&body.to_string(), MAX_LOGGABLE_BODY_LENGTH)
                );
            }
        }
    }
}

impl Default for TracingReporter {
    fn default() -> Self {
        Self::new(ResponseLoggingLevel::default())
    }
}

impl Reporter for TracingReporter {
    fn report(&self, run: &WorkflowRun) {
        for step in &run.results {
            self.report_step(&run.workflow, step);
        }
        if run.passed() {
            info!(
                "Workflow '{}' PASSED ({} steps, {}ms)",
                run.workflow,
                run.results.len(),
                run.elapsed_ms
            );
        } else {
            error!(
                "Workflow '{}' FAILED: {} ({} failed, {} not run)",
                run.workflow,
                run.state,
                run.count(Verdict::is_failure),
                run.count(|v| *v == Verdict::NotRun)
            );
        }
    }
}

/// Collects runs and writes them to a JSON file.
#[derive(Default)]
pub struct JsonReporter {
    runs: Mutex<Vec<WorkflowRun>>,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String> {
        let runs = self
            .runs
            .lock()
            .map_err(|_| anyhow::anyhow!("JSON report lock poisoned"))?;
        serde_json::to_string_pretty(&*runs).context("Failed to serialize run report")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Wrote JSON report to {}", path.display());
        Ok(())
    }
}

impl Reporter for JsonReporter {
    fn report(&self, run: &WorkflowRun) {
        match self.runs.lock() {
            Ok(mut runs) => runs.push(run.clone()),
            Err(_) => error!("JSON report lock poisoned, dropping run '{}'", run.workflow),
        }
    }
}

/// One row of the final summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub workflow: String,
    pub state: String,
    pub passed: usize,
    pub failed: usize,
    pub not_run: usize,
    pub elapsed_ms: u64,
    pub ok: bool,
}

/// Pass/fail counts across every run, printed at the end of the CLI run.
#[derive(Default)]
pub struct RunSummary {
    rows: Mutex<Vec<SummaryRow>>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<SummaryRow> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// True when at least one run was reported and every run passed.
    pub fn all_passed(&self) -> bool {
        let rows = self.rows();
        !rows.is_empty() && rows.iter().all(|r| r.ok)
    }

    pub fn render(&self) -> String {
        let rows = self.rows();
        let width = rows
            .iter()
            .map(|r| r.workflow.len())
            .max()
            .unwrap_or(0)
            .max("WORKFLOW".len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<width$}  {:<6}  {:>6}  {:>6}  {:>7}  {:>8}  STATE",
            "WORKFLOW",
            "RESULT",
            "PASSED",
            "FAILED",
            "NOT RUN",
            "TIME",
            width = width
        );
        for row in &rows {
            let _ = writeln!(
                out,
                "{:<width$}  {:<6}  {:>6}  {:>6}  {:>7}  {:>6}ms  {}",
                row.workflow,
                if row.ok { "PASS" } else { "FAIL" },
                row.passed,
                row.failed,
                row.not_run,
                row.elapsed_ms,
                row.state,
                width = width
            );
        }
        let failed = rows.iter().filter(|r| !r.ok).count();
        let _ = write!(
            out,
            "{} workflow(s), {} passed, {} failed",
            rows.len(),
            rows.len() - failed,
            failed
        );
        out
    }
}

impl Reporter for RunSummary {
    fn report(&self, run: &WorkflowRun) {
        let row = SummaryRow {
            workflow: run.workflow.clone(),
            state: run.state.to_string(),
            passed: run.count(Verdict::is_passed),
            failed: run.count(Verdict::is_failure),
            not_run: run.count(|v| *v == Verdict::NotRun),
            elapsed_ms: run.elapsed_ms,
            ok: run.passed(),
        };
        if let Ok(mut rows) = self.rows.lock() {
            rows.push(row);
        }
    }
}
