//! Declarative checks on responses.
//!
//! Expectations may reference context slots (`Expected::Slot`); those are
//! resolved against the run's context before the request is sent, so a
//! missing slot is reported before anything reaches the API.

use super::context::{MissingSlot, WorkflowContext};
use super::path::{describe, lookup, values_match};
use crate::client::ApiResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Predicate on an array length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPredicate {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl LengthPredicate {
    pub fn matches(&self, len: usize) -> bool {
        match self {
            LengthPredicate::Exactly(n) => len == *n,
            LengthPredicate::AtLeast(n) => len >= *n,
            LengthPredicate::AtMost(n) => len <= *n,
        }
    }
}

impl fmt::Display for LengthPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthPredicate::Exactly(n) => write!(f, "== {}", n),
            LengthPredicate::AtLeast(n) => write!(f, ">= {}", n),
            LengthPredicate::AtMost(n) => write!(f, "<= {}", n),
        }
    }
}

/// Right-hand side of an equality check.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Value(Value),
    /// The current value of a context slot.
    Slot(String),
}

impl Expected {
    fn resolve(&self, ctx: &WorkflowContext) -> Result<Expected, MissingSlot> {
        match self {
            Expected::Slot(slot) => ctx.get(slot).cloned().map(Expected::Value),
            value => Ok(value.clone()),
        }
    }

    fn value(&self) -> Option<&Value> {
        match self {
            Expected::Value(v) => Some(v),
            Expected::Slot(_) => None,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Value(v) => f.write_str(&describe(Some(v))),
            Expected::Slot(slot) => write!(f, "{{{{{}}}}}", slot),
        }
    }
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        Expected::Value(value)
    }
}

/// A single check on a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    Status(u16),
    StatusIn(Vec<u16>),
    /// Negative check, e.g. a public endpoint must not answer 401/403.
    StatusNotIn(Vec<u16>),
    HasProperty(String),
    /// At least one of the paths is present. Tolerates body shapes that
    /// differ between backend versions (`user` vs `userDetails`).
    HasAnyProperty(Vec<String>),
    PropertyEquals(String, Expected),
    NonEmptyString(String),
    IsArray(String),
    ArrayNonEmpty(String),
    ArrayLength(String, LengthPredicate),
    /// Some element of the array at `path` has `field` equal to `value`.
    ArrayContains {
        path: String,
        field: String,
        value: Expected,
    },
    /// The array at `path` has no element whose `field` equals `value`.
    ArrayNotContains {
        path: String,
        field: String,
        value: Expected,
    },
}

/// A failed expectation, with what was expected and what was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    pub expectation: String,
    pub expected: String,
    pub actual: String,
}

impl AssertionFailure {
    pub fn new(
        expectation: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            expectation: expectation.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.expectation, self.expected, self.actual
        )
    }
}

impl Expectation {
    pub fn status(code: u16) -> Self {
        Expectation::Status(code)
    }

    pub fn status_in(codes: &[u16]) -> Self {
        Expectation::StatusIn(codes.to_vec())
    }

    pub fn status_not_in(codes: &[u16]) -> Self {
        Expectation::StatusNotIn(codes.to_vec())
    }

    pub fn has(path: impl Into<String>) -> Self {
        Expectation::HasProperty(path.into())
    }

    pub fn has_any<S: AsRef<str>>(paths: &[S]) -> Self {
        Expectation::HasAnyProperty(paths.iter().map(|p| p.as_ref().to_string()).collect())
    }

    pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Expectation::PropertyEquals(path.into(), Expected::Value(value.into()))
    }

    pub fn equals_slot(path: impl Into<String>, slot: impl Into<String>) -> Self {
        Expectation::PropertyEquals(path.into(), Expected::Slot(slot.into()))
    }

    pub fn non_empty_string(path: impl Into<String>) -> Self {
        Expectation::NonEmptyString(path.into())
    }

    pub fn is_array(path: impl Into<String>) -> Self {
        Expectation::IsArray(path.into())
    }

    pub fn array_non_empty(path: impl Into<String>) -> Self {
        Expectation::ArrayNonEmpty(path.into())
    }

    pub fn array_len(path: impl Into<String>, predicate: LengthPredicate) -> Self {
        Expectation::ArrayLength(path.into(), predicate)
    }

    pub fn array_contains(
        path: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Expected>,
    ) -> Self {
        Expectation::ArrayContains {
            path: path.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn array_contains_slot(
        path: impl Into<String>,
        field: impl Into<String>,
        slot: impl Into<String>,
    ) -> Self {
        Self::array_contains(path, field, Expected::Slot(slot.into()))
    }

    pub fn array_lacks(
        path: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Expected>,
    ) -> Self {
        Expectation::ArrayNotContains {
            path: path.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn array_lacks_slot(
        path: impl Into<String>,
        field: impl Into<String>,
        slot: impl Into<String>,
    ) -> Self {
        Self::array_lacks(path, field, Expected::Slot(slot.into()))
    }

    /// Whether this expectation looks at the response body.
    pub fn needs_body(&self) -> bool {
        !matches!(
            self,
            Expectation::Status(_) | Expectation::StatusIn(_) | Expectation::StatusNotIn(_)
        )
    }

    /// Replaces slot references with the current context values.
    pub fn resolve(&self, ctx: &WorkflowContext) -> Result<Expectation, MissingSlot> {
        Ok(match self {
            Expectation::PropertyEquals(path, expected) => {
                Expectation::PropertyEquals(path.clone(), expected.resolve(ctx)?)
            }
            Expectation::ArrayContains { path, field, value } => Expectation::ArrayContains {
                path: path.clone(),
                field: field.clone(),
                value: value.resolve(ctx)?,
            },
            Expectation::ArrayNotContains { path, field, value } => {
                Expectation::ArrayNotContains {
                    path: path.clone(),
                    field: field.clone(),
                    value: value.resolve(ctx)?,
                }
            }
            other => other.clone(),
        })
    }

    /// Checks the expectation against a response.
    ///
    /// Unresolved slot references never match; call [`Expectation::resolve`]
    /// first.
    pub fn check(&self, response: &ApiResponse) -> Result<(), AssertionFailure> {
        let null = Value::Null;
        let body = response.body.as_ref().unwrap_or(&null);
        let fail = |expected: String, actual: String| {
            Err(AssertionFailure::new(self.to_string(), expected, actual))
        };

        match self {
            Expectation::Status(code) => {
                if response.status == *code {
                    Ok(())
                } else {
                    fail(code.to_string(), response.status.to_string())
                }
            }
            Expectation::StatusIn(codes) => {
                if codes.contains(&response.status) {
                    Ok(())
                } else {
                    fail(format!("one of {:?}", codes), response.status.to_string())
                }
            }
            Expectation::StatusNotIn(codes) => {
                if codes.contains(&response.status) {
                    fail(format!("none of {:?}", codes), response.status.to_string())
                } else {
                    Ok(())
                }
            }
            Expectation::HasProperty(path) => match lookup(body, path) {
                Some(_) => Ok(()),
                None => fail("present".to_string(), body_summary(response)),
            },
            Expectation::HasAnyProperty(paths) => {
                if paths.iter().any(|p| lookup(body, p).is_some()) {
                    Ok(())
                } else {
                    fail(
                        format!("any of {:?} present", paths),
                        body_summary(response),
                    )
                }
            }
            Expectation::PropertyEquals(path, expected) => {
                let actual = lookup(body, path);
                match (actual, expected.value()) {
                    (Some(a), Some(e)) if values_match(a, e) => Ok(()),
                    _ => fail(expected.to_string(), describe(actual)),
                }
            }
            Expectation::NonEmptyString(path) => match lookup(body, path) {
                Some(Value::String(s)) if !s.is_empty() => Ok(()),
                other => fail("non-empty string".to_string(), describe(other)),
            },
            Expectation::IsArray(path) => match lookup(body, path) {
                Some(Value::Array(_)) => Ok(()),
                other => fail("array".to_string(), describe(other)),
            },
            Expectation::ArrayNonEmpty(path) => match lookup(body, path) {
                Some(Value::Array(items)) if !items.is_empty() => Ok(()),
                other => fail("non-empty array".to_string(), describe(other)),
            },
            Expectation::ArrayLength(path, predicate) => match lookup(body, path) {
                Some(Value::Array(items)) if predicate.matches(items.len()) => Ok(()),
                other => fail(format!("array length {}", predicate), describe(other)),
            },
            Expectation::ArrayContains { path, field, value } => {
                let found = match (lookup(body, path), value.value()) {
                    (Some(Value::Array(items)), Some(expected)) => items.iter().any(|item| {
                        lookup(item, field)
                            .map(|v| values_match(v, expected))
                            .unwrap_or(false)
                    }),
                    _ => false,
                };
                if found {
                    Ok(())
                } else {
                    fail(
                        format!("element with {} = {}", field, value),
                        describe(lookup(body, path)),
                    )
                }
            }
            Expectation::ArrayNotContains { path, field, value } => {
                match (lookup(body, path), value.value()) {
                    (Some(Value::Array(items)), Some(expected)) => {
                        let hits = items
                            .iter()
                            .filter(|item| {
                                lookup(item, field)
                                    .map(|v| values_match(v, expected))
                                    .unwrap_or(false)
                            })
                            .count();
                        if hits == 0 {
                            Ok(())
                        } else {
                            fail(
                                format!("no element with {} = {}", field, value),
                                format!("{} matching element(s)", hits),
                            )
                        }
                    }
                    (other, _) => fail(
                        format!("array without {} = {}", field, value),
                        describe(other),
                    ),
                }
            }
        }
    }
}

fn body_summary(response: &ApiResponse) -> String {
    match &response.body {
        Some(Value::Object(map)) => {
            let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
            format!("object with keys {:?}", keys)
        }
        Some(other) => describe(Some(other)),
        None if response.raw_body.is_empty() => "empty body".to_string(),
        None => "non-JSON body".to_string(),
    }
}

fn root(path: &str) -> &str {
    if path.is_empty() {
        "body"
    } else {
        path
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Status(code) => write!(f, "status == {}", code),
            Expectation::StatusIn(codes) => write!(f, "status in {:?}", codes),
            Expectation::StatusNotIn(codes) => write!(f, "status not in {:?}", codes),
            Expectation::HasProperty(path) => write!(f, "{} is present", root(path)),
            Expectation::HasAnyProperty(paths) => write!(f, "any of {:?} is present", paths),
            Expectation::PropertyEquals(path, expected) => {
                write!(f, "{} == {}", root(path), expected)
            }
            Expectation::NonEmptyString(path) => write!(f, "{} is a non-empty string", root(path)),
            Expectation::IsArray(path) => write!(f, "{} is an array", root(path)),
            Expectation::ArrayNonEmpty(path) => write!(f, "{} is a non-empty array", root(path)),
            Expectation::ArrayLength(path, predicate) => {
                write!(f, "length of {} {}", root(path), predicate)
            }
            Expectation::ArrayContains { path, field, value } => {
                write!(f, "{} contains an element with {} == {}", root(path), field, value)
            }
            Expectation::ArrayNotContains { path, field, value } => {
                write!(f, "{} has no element with {} == {}", root(path), field, value)
            }
        }
    }
}
