//! Dotted field paths into JSON values.
//!
//! `"songResponse.0.id"` reads key `songResponse`, then array index `0`, then
//! key `id`. The empty path addresses the value itself.

use serde_json::Value;

pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Loose equality used when comparing identifiers: `42` matches `"42"`.
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => false,
    }
}

/// Short human-readable rendering of a JSON value for diagnostics.
pub fn describe(value: Option<&Value>) -> String {
    match value {
        None => "<missing>".to_string(),
        Some(Value::String(s)) => format!("\"{}\"", s),
        Some(Value::Array(items)) => format!("array of {}", items.len()),
        Some(Value::Object(_)) => "object".to_string(),
        Some(other) => other.to_string(),
    }
}
