//! Workflow runner.

use super::context::{MissingSlot, WorkflowContext};
use super::error::HarnessError;
use super::expect::{AssertionFailure, Expectation};
use super::path::{describe, lookup};
use super::probe::{ConcurrencyProbe, ProbeResponse};
use super::reporter::Reporter;
use super::result::{ProbeOutcome, StepResult, Verdict};
use super::state::RunState;
use super::step::{Step, StepAction};
use super::workflow::Workflow;
use crate::client::{ApiResponse, ApiTransport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What happens after a step fails an assertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failing step ends the run.
    #[default]
    AbortRemaining,
    /// Every step runs, each against its own copy of the fixture context.
    ContinueOnFailure,
}

/// Everything a single workflow run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub run_id: Uuid,
    pub workflow: String,
    pub policy: FailurePolicy,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// One entry per step, in workflow order.
    pub results: Vec<StepResult>,
    pub context: BTreeMap<String, Value>,
}

impl WorkflowRun {
    /// Completed, with no failed step.
    pub fn passed(&self) -> bool {
        self.state == RunState::Completed && !self.results.iter().any(|r| r.verdict.is_failure())
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter().filter(|r| r.verdict.is_failure())
    }

    pub fn count(&self, pred: impl Fn(&Verdict) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.verdict)).count()
    }
}

/// How a response was judged before captures are applied.
enum Judgement {
    Failures(Vec<AssertionFailure>),
    Unusable(String),
}

/// Runs workflows step by step against a transport.
pub struct WorkflowRunner {
    transport: Arc<dyn ApiTransport>,
    probe: ConcurrencyProbe,
    policy: Option<FailurePolicy>,
}

impl WorkflowRunner {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            probe: ConcurrencyProbe::new(Arc::clone(&transport)),
            transport,
            policy: None,
        }
    }

    /// Forces a failure policy for every workflow, overriding their own.
    pub fn with_policy(mut self, policy: Option<FailurePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub async fn run(&self, workflow: &Workflow) -> Result<WorkflowRun, HarnessError> {
        self.run_in(workflow, WorkflowContext::new()).await
    }

    /// Runs `workflows` in order, handing each finished run to every
    /// reporter.
    ///
    /// Stops at the first malformed workflow. Runs that finished before it
    /// have already been reported.
    pub async fn run_all(
        &self,
        workflows: &[Workflow],
        reporters: &[&dyn Reporter],
    ) -> Result<(), HarnessError> {
        for workflow in workflows {
            let run = match self.run(workflow).await {
                Ok(run) => run,
                Err(e) => {
                    error!("Workflow '{}' is malformed: {}", workflow.name, e);
                    return Err(e);
                }
            };
            for reporter in reporters {
                reporter.report(&run);
            }
        }
        Ok(())
    }

    /// Runs `workflow` starting from `context`, with the workflow fixtures
    /// layered on top.
    ///
    /// Returns `Err` only for harness defects (a step reading a slot nobody
    /// wrote). API failures are recorded in the returned run.
    pub async fn run_in(
        &self,
        workflow: &Workflow,
        mut context: WorkflowContext,
    ) -> Result<WorkflowRun, HarnessError> {
        let policy = self.policy.unwrap_or(workflow.policy);
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = RunState::default();
        let mut results = Vec::with_capacity(workflow.steps.len());

        for (slot, value) in &workflow.fixtures {
            context.set(slot.clone(), value.clone());
        }

        info!(
            "Starting workflow '{}' ({} steps, {:?})",
            workflow.name,
            workflow.steps.len(),
            policy
        );

        for (index, step) in workflow.steps.iter().enumerate() {
            state.transition(RunState::Running { step: index })?;

            let result = match policy {
                FailurePolicy::AbortRemaining => self.execute(index, step, &mut context).await?,
                FailurePolicy::ContinueOnFailure => {
                    let mut scratch = context.clone();
                    self.execute(index, step, &mut scratch).await?
                }
            };
            let verdict = result.verdict.clone();
            results.push(result);

            match verdict {
                Verdict::InfrastructureFailure { reason } => {
                    warn!(
                        "Workflow '{}' step {} '{}' got no usable response: {}",
                        workflow.name, index, step.label, reason
                    );
                    state.transition(RunState::InfrastructureFailure { step: index })?;
                    break;
                }
                Verdict::AssertionFailed { .. } if policy == FailurePolicy::AbortRemaining => {
                    state.transition(RunState::Aborted { step: index })?;
                    break;
                }
                _ => {}
            }
        }

        if !state.is_terminal() {
            state.transition(RunState::Completed)?;
        }

        for (index, step) in workflow.steps.iter().enumerate().skip(results.len()) {
            results.push(StepResult::not_run(
                index,
                step.label.clone(),
                step.request.method,
                step.request.path.clone(),
            ));
        }

        let run = WorkflowRun {
            run_id: Uuid::new_v4(),
            workflow: workflow.name.clone(),
            policy,
            state,
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            results,
            context: context.snapshot(),
        };
        info!(
            "Workflow '{}' finished: {} ({}ms)",
            run.workflow, run.state, run.elapsed_ms
        );
        Ok(run)
    }

    async fn execute(
        &self,
        index: usize,
        step: &Step,
        ctx: &mut WorkflowContext,
    ) -> Result<StepResult, HarnessError> {
        let missing = |e: MissingSlot| HarnessError::MissingContextSlot {
            slot: e.0,
            step: step.label.clone(),
        };
        let request = step.request.resolve(ctx).map_err(missing)?;
        let expectations = resolve_all(&step.expectations, ctx).map_err(missing)?;
        let soft = resolve_all(&step.soft_expectations, ctx).map_err(missing)?;

        let mut result = StepResult::not_run(
            index,
            step.label.clone(),
            request.method,
            request.path.clone(),
        );
        debug!("Step {} '{}': {}", index, step.label, request);
        let start = Instant::now();

        result.verdict = match &step.action {
            StepAction::Request => match self.transport.send(&request).await {
                Err(e) => Verdict::InfrastructureFailure {
                    reason: e.to_string(),
                },
                Ok(response) => {
                    result.status = Some(response.status);
                    result.body = response.body.clone();
                    result.warnings = soft_warnings(&soft, &response);
                    self.settle(step, &expectations, &response, ctx)
                }
            },
            StepAction::FanOut { count, distinct } => {
                match self.probe.fan_out(&request, *count).await {
                    Err(e) => Verdict::InfrastructureFailure {
                        reason: e.to_string(),
                    },
                    Ok(responses) => {
                        result.fan_out = responses.iter().map(outcome).collect();
                        judge_fan_out(step, &expectations, &responses, distinct.as_deref())
                    }
                }
            }
        };
        result.elapsed_ms = start.elapsed().as_millis() as u64;

        for warning in &result.warnings {
            warn!("Step {} '{}': {}", index, step.label, warning);
        }
        Ok(result)
    }

    /// Judges a single response and, when it passes, writes captures and
    /// custom updates into the context.
    fn settle(
        &self,
        step: &Step,
        expectations: &[Expectation],
        response: &ApiResponse,
        ctx: &mut WorkflowContext,
    ) -> Verdict {
        let mut failures = match judge(step, expectations, response) {
            Judgement::Unusable(reason) => return Verdict::InfrastructureFailure { reason },
            Judgement::Failures(failures) => failures,
        };

        let body = response.body_or_null();
        let mut captured = Vec::with_capacity(step.captures.len());
        for capture in &step.captures {
            match lookup(&body, &capture.path) {
                Some(value) => captured.push((capture.slot.clone(), value.clone())),
                None => failures.push(AssertionFailure::new(
                    format!("capture '{}' from {}", capture.slot, capture.path),
                    "present",
                    describe(None),
                )),
            }
        }

        if !failures.is_empty() {
            return Verdict::AssertionFailed { failures };
        }

        for (slot, value) in captured {
            ctx.set(slot, value);
        }
        for update in &step.updates {
            update(&body, ctx);
        }
        Verdict::Passed
    }
}

fn resolve_all(
    expectations: &[Expectation],
    ctx: &WorkflowContext,
) -> Result<Vec<Expectation>, MissingSlot> {
    expectations.iter().map(|e| e.resolve(ctx)).collect()
}

/// A wrong status is an assertion failure even when the body is garbage;
/// a right status with a garbage body the step needs is unusable.
fn judge(step: &Step, expectations: &[Expectation], response: &ApiResponse) -> Judgement {
    let failures: Vec<AssertionFailure> = expectations
        .iter()
        .filter_map(|e| e.check(response).err())
        .collect();

    let status_failed = expectations
        .iter()
        .any(|e| !e.needs_body() && e.check(response).is_err());

    if !status_failed && step.requires_json() && response.has_malformed_body() {
        return Judgement::Unusable(format!(
            "Expected a JSON body, got {} bytes of non-JSON (status {})",
            response.raw_body.len(),
            response.status
        ));
    }
    Judgement::Failures(failures)
}

fn soft_warnings(soft: &[Expectation], response: &ApiResponse) -> Vec<String> {
    soft.iter()
        .filter_map(|e| e.check(response).err())
        .map(|f| f.to_string())
        .collect()
}

fn outcome(probe: &ProbeResponse) -> ProbeOutcome {
    ProbeOutcome {
        index: probe.index,
        status: probe.response.status,
        elapsed_ms: probe.elapsed_ms,
        body: probe.response.body.clone(),
    }
}

fn judge_fan_out(
    step: &Step,
    expectations: &[Expectation],
    responses: &[ProbeResponse],
    distinct: Option<&str>,
) -> Verdict {
    let mut failures = Vec::new();

    for probe in responses {
        match judge(step, expectations, &probe.response) {
            Judgement::Unusable(reason) => {
                return Verdict::InfrastructureFailure {
                    reason: format!("Response #{}: {}", probe.index, reason),
                }
            }
            Judgement::Failures(found) => {
                failures.extend(found.into_iter().map(|mut f| {
                    f.expectation = format!("response #{}: {}", probe.index, f.expectation);
                    f
                }));
            }
        }
    }

    if let Some(path) = distinct {
        let values: Vec<Option<Value>> = responses
            .iter()
            .map(|p| p.response.body.as_ref().and_then(|b| lookup(b, path)).cloned())
            .collect();
        let present: Vec<&Value> = values.iter().flatten().collect();
        let unique: HashSet<String> = present.iter().map(|v| v.to_string()).collect();

        if present.len() != responses.len() || unique.len() != responses.len() {
            let seen: Vec<String> = values.iter().map(|v| describe(v.as_ref())).collect();
            failures.push(AssertionFailure::new(
                format!("{} is distinct across {} responses", path, responses.len()),
                format!("{} distinct values", responses.len()),
                format!("[{}]", seen.join(", ")),
            ));
        }
    }

    if failures.is_empty() {
        Verdict::Passed
    } else {
        Verdict::AssertionFailed { failures }
    }
}
