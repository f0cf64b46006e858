use super::runner::FailurePolicy;
use super::step::Step;
use serde_json::Value;
use std::collections::BTreeMap;

/// A named, ordered list of steps plus the fixtures seeded into the context
/// before the first step runs.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    pub description: String,
    pub policy: FailurePolicy,
    pub fixtures: BTreeMap<String, Value>,
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            policy: FailurePolicy::default(),
            fixtures: BTreeMap::new(),
            steps: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn fixture(mut self, slot: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fixtures.insert(slot.into(), value.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }
}
