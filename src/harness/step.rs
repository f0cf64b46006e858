//! Workflow steps: a request template, the checks to run on the response,
//! and the context updates to apply when the step passes.

use super::context::{MissingSlot, WorkflowContext};
use super::expect::Expectation;
use super::template::{render_str, render_text, render_value};
use crate::client::{ApiRequest, HttpMethod, RequestBody};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// How a request authenticates.
#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    None,
    /// Bearer token read from a context slot.
    Bearer(String),
    /// Literal `Authorization` header value, for malformed-token probes.
    Raw(String),
}

/// Body template; strings may hold `{{slot}}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyTemplate {
    Empty,
    Json(Value),
    Multipart(Vec<(String, String)>),
}

/// A request whose path, headers and body are rendered from the context
/// right before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    pub method: HttpMethod,
    pub path: String,
    pub auth: Auth,
    pub headers: Vec<(String, String)>,
    pub body: BodyTemplate,
}

impl RequestTemplate {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            auth: Auth::None,
            headers: Vec::new(),
            body: BodyTemplate::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn bearer(mut self, slot: impl Into<String>) -> Self {
        self.auth = Auth::Bearer(slot.into());
        self
    }

    pub fn raw_authorization(mut self, value: impl Into<String>) -> Self {
        self.auth = Auth::Raw(value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = BodyTemplate::Json(body);
        self
    }

    pub fn multipart<K: Into<String>, V: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.body = BodyTemplate::Multipart(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Renders the template into a request. Fails on the first slot the
    /// context does not hold.
    pub fn resolve(&self, ctx: &WorkflowContext) -> Result<ApiRequest, MissingSlot> {
        let mut request = ApiRequest::new(self.method, render_str(&self.path, ctx)?);

        for (name, value) in &self.headers {
            request = request.with_header(name.clone(), render_text(value, ctx)?);
        }

        request = match &self.auth {
            Auth::None => request,
            Auth::Bearer(slot) => request.with_bearer(ctx.get_str(slot)?),
            Auth::Raw(value) => request.with_header("Authorization", render_text(value, ctx)?),
        };

        request.body = match &self.body {
            BodyTemplate::Empty => RequestBody::Empty,
            BodyTemplate::Json(template) => RequestBody::Json(render_value(template, ctx)?),
            BodyTemplate::Multipart(fields) => RequestBody::Multipart(
                fields
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), render_text(value, ctx)?)))
                    .collect::<Result<Vec<_>, MissingSlot>>()?,
            ),
        };

        Ok(request)
    }
}

/// Copies a response field into a context slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub slot: String,
    pub path: String,
}

/// Custom context update, applied to the response body when the step passes.
pub type ContextUpdate = Arc<dyn Fn(&Value, &mut WorkflowContext) + Send + Sync>;

/// What a step sends.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    Request,
    /// Sends the request `count` times concurrently. When `distinct` is set,
    /// the field at that path must differ across all responses.
    FanOut {
        count: usize,
        distinct: Option<String>,
    },
}

/// One step of a workflow.
#[derive(Clone)]
pub struct Step {
    pub label: String,
    pub request: RequestTemplate,
    pub action: StepAction,
    pub expectations: Vec<Expectation>,
    /// Checks whose failure is reported as a warning only.
    pub soft_expectations: Vec<Expectation>,
    pub captures: Vec<Capture>,
    pub updates: Vec<ContextUpdate>,
}

impl Step {
    pub fn new(label: impl Into<String>, request: RequestTemplate) -> Self {
        Self {
            label: label.into(),
            request,
            action: StepAction::Request,
            expectations: Vec::new(),
            soft_expectations: Vec::new(),
            captures: Vec::new(),
            updates: Vec::new(),
        }
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    pub fn expect_soft(mut self, expectation: Expectation) -> Self {
        self.soft_expectations.push(expectation);
        self
    }

    /// Stores the response field at `path` in `slot`. A missing field fails
    /// the step.
    pub fn capture(mut self, slot: impl Into<String>, path: impl Into<String>) -> Self {
        self.captures.push(Capture {
            slot: slot.into(),
            path: path.into(),
        });
        self
    }

    pub fn on_success<F>(mut self, update: F) -> Self
    where
        F: Fn(&Value, &mut WorkflowContext) + Send + Sync + 'static,
    {
        self.updates.push(Arc::new(update));
        self
    }

    pub fn fan_out(mut self, count: usize) -> Self {
        self.action = StepAction::FanOut {
            count,
            distinct: None,
        };
        self
    }

    /// Requires `path` to be unique across fan-out responses.
    pub fn distinct(mut self, path: impl Into<String>) -> Self {
        let count = match self.action {
            StepAction::FanOut { count, .. } => count,
            StepAction::Request => 1,
        };
        self.action = StepAction::FanOut {
            count,
            distinct: Some(path.into()),
        };
        self
    }

    /// Whether a non-JSON response makes the step unjudgeable.
    pub fn requires_json(&self) -> bool {
        !self.captures.is_empty()
            || !self.updates.is_empty()
            || matches!(
                self.action,
                StepAction::FanOut {
                    distinct: Some(_),
                    ..
                }
            )
            || self.expectations.iter().any(|e| e.needs_body())
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("label", &self.label)
            .field("request", &self.request)
            .field("action", &self.action)
            .field("expectations", &self.expectations)
            .field("soft_expectations", &self.soft_expectations)
            .field("captures", &self.captures)
            .field("updates", &self.updates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_request() {
        let mut ctx = WorkflowContext::new();
        ctx.set("clientToken", "jwt-1");
        ctx.set("songId", 8);
        ctx.set("dj", json!({"email": "dj@spinwish.com"}));

        let request = RequestTemplate::post("/api/v1/requests")
            .bearer("clientToken")
            .json(json!({"djEmailAddress": "{{dj.email}}", "songId": "{{songId}}"}))
            .resolve(&ctx)
            .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "/api/v1/requests");
        assert_eq!(request.bearer.as_deref(), Some("jwt-1"));
        assert_eq!(
            request.body,
            RequestBody::Json(json!({"djEmailAddress": "dj@spinwish.com", "songId": 8}))
        );
    }

    #[test]
    fn test_resolve_multipart_and_raw_auth() {
        let mut ctx = WorkflowContext::new();
        ctx.set("artistName", "Daft Punk");

        let request = RequestTemplate::post("/api/v1/artists")
            .raw_authorization("Bearer not-a-jwt")
            .multipart([("name", "{{artistName}}"), ("bio", "French duo")])
            .resolve(&ctx)
            .unwrap();

        assert_eq!(
            request.headers,
            vec![("Authorization".to_string(), "Bearer not-a-jwt".to_string())]
        );
        assert_eq!(
            request.body,
            RequestBody::Multipart(vec![
                ("name".to_string(), "Daft Punk".to_string()),
                ("bio".to_string(), "French duo".to_string()),
            ])
        );
    }

    #[test]
    fn test_resolve_missing_bearer_slot() {
        let ctx = WorkflowContext::new();
        let result = RequestTemplate::get("/api/v1/users")
            .bearer("djToken")
            .resolve(&ctx);
        assert_eq!(result, Err(MissingSlot("djToken".to_string())));
    }

    #[test]
    fn test_requires_json() {
        let status_only = Step::new("delete", RequestTemplate::delete("/api/v1/songs/1"))
            .expect(Expectation::status(204));
        assert!(!status_only.requires_json());

        let capturing = Step::new("create", RequestTemplate::post("/api/v1/songs"))
            .expect(Expectation::status(201))
            .capture("songId", "id");
        assert!(capturing.requires_json());

        let fan_out = Step::new("burst", RequestTemplate::post("/api/v1/requests"))
            .fan_out(5)
            .distinct("id");
        assert_eq!(
            fan_out.action,
            StepAction::FanOut {
                count: 5,
                distinct: Some("id".to_string())
            }
        );
        assert!(fan_out.requires_json());
    }
}
