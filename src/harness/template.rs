//! `{{slot}}` placeholders in paths, headers and bodies.

use super::context::{value_as_text, MissingSlot, WorkflowContext};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.]*)\s*\}\}").unwrap();
}

/// Names of every slot referenced by `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

/// Replaces every placeholder in `template` with the text of its slot.
pub fn render_str(template: &str, ctx: &WorkflowContext) -> Result<String, MissingSlot> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;
    for captures in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        rendered.push_str(&template[last..whole.start()]);
        rendered.push_str(&ctx.get_str(&captures[1])?);
        last = whole.end();
    }
    rendered.push_str(&template[last..]);
    Ok(rendered)
}

/// Renders a JSON template.
///
/// A string consisting of a single placeholder is replaced by the slot value
/// itself, keeping its JSON type (`"{{songId}}"` becomes `12`, not `"12"`).
/// Any other string has its placeholders interpolated as text.
pub fn render_value(template: &Value, ctx: &WorkflowContext) -> Result<Value, MissingSlot> {
    match template {
        Value::String(s) => {
            if let Some(slot) = sole_placeholder(s) {
                return ctx.get(slot).cloned();
            }
            render_str(s, ctx).map(Value::String)
        }
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut rendered = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                rendered.insert(key.clone(), render_value(value, ctx)?);
            }
            Ok(Value::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}

/// Text form of a rendered value, for multipart fields and headers.
pub fn render_text(template: &str, ctx: &WorkflowContext) -> Result<String, MissingSlot> {
    match sole_placeholder(template) {
        Some(slot) => ctx.get(slot).map(value_as_text),
        None => render_str(template, ctx),
    }
}

fn sole_placeholder(s: &str) -> Option<&str> {
    let captures = PLACEHOLDER.captures(s)?;
    let whole = captures.get(0)?;
    if whole.start() == 0 && whole.end() == s.len() {
        captures.get(1).map(|m| m.as_str())
    } else {
        None
    }
}
