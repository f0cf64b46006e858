//! Per-run state threaded through workflow steps.

use super::path::lookup;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// A context slot was read before any step wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Context slot '{0}' was never set")]
pub struct MissingSlot(pub String);

/// Named slots (tokens, created IDs, generated identities) owned by one run.
///
/// Values are addressed either by slot name (`songId`) or by slot name
/// followed by a field path (`client.email`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowContext {
    slots: BTreeMap<String, Value>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(slots: BTreeMap<String, Value>) -> Self {
        Self { slots }
    }

    /// Reads a slot, or a field inside a slot when `key` contains dots.
    pub fn get(&self, key: &str) -> Result<&Value, MissingSlot> {
        let (slot, path) = match key.split_once('.') {
            Some((slot, path)) => (slot, path),
            None => (key, ""),
        };
        self.slots
            .get(slot)
            .and_then(|value| lookup(value, path))
            .ok_or_else(|| MissingSlot(key.to_string()))
    }

    /// Reads a value as text. Strings are returned unquoted.
    pub fn get_str(&self, key: &str) -> Result<String, MissingSlot> {
        self.get(key).map(value_as_text)
    }

    pub fn set(&mut self, slot: impl Into<String>, value: impl Into<Value>) {
        self.slots.insert(slot.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Read-only copy of every slot, for reporting.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.slots.clone()
    }
}

pub(crate) fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
