//! Authentication workflows.

use super::common::{login, signup, LOGIN, SIGNUP};
use super::WorkflowSettings;
use crate::harness::{Expectation, FailurePolicy, RequestTemplate, Step, Workflow};
use crate::identity::Role;
use serde_json::json;

pub(super) const SIGNUP_LOGIN: &str = "signup-login";
pub(super) const AUTH_GUARD: &str = "auth-guard";
pub(super) const PUBLIC_ENDPOINTS: &str = "public-endpoints";

const PROTECTED_RESOURCES: &[&str] = &[
    "users", "artists", "songs", "requests", "clubs", "sessions", "djs", "roles",
];

const MALFORMED_TOKEN: &str = "Bearer invalid-token";

/// Writes attempted without any token.
fn unauthenticated_writes() -> Vec<Step> {
    vec![
        Step::new(
            "create artist without token",
            RequestTemplate::post("/api/v1/artists")
                .multipart([("name", "Unauthorized Artist"), ("bio", "Should not be created")]),
        ),
        Step::new(
            "create song without token",
            RequestTemplate::post("/api/v1/songs").json(json!({
                "name": "Unauthorized Song",
                "album": "Unauthorized Album",
            })),
        ),
        Step::new(
            "request song without token",
            RequestTemplate::post("/api/v1/requests").json(json!({
                "djEmailAddress": "dj@spinwish.com",
                "songId": "00000000-0000-0000-0000-000000000000",
            })),
        ),
    ]
    .into_iter()
    .map(|step| step.expect(Expectation::status(401)))
    .collect()
}

pub(super) fn signup_login(settings: &WorkflowSettings) -> Workflow {
    let client = settings.identities.identity(Role::Client);

    Workflow::new(SIGNUP_LOGIN)
        .fixture("client", client.slot_value())
        .step(signup("client"))
        .step(login("client", "clientToken", settings))
        .step(
            Step::new(
                "log in with wrong password",
                RequestTemplate::post(LOGIN).json(json!({
                    "emailAddress": "{{client.email}}",
                    "password": "wrong-{{client.password}}",
                })),
            )
            .expect(Expectation::status(401)),
        )
        .step(
            Step::new(
                "list users with token",
                RequestTemplate::get("/api/v1/users").bearer("clientToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::is_array("")),
        )
}

pub(super) fn auth_guard(_settings: &WorkflowSettings) -> Workflow {
    let mut workflow = Workflow::new(AUTH_GUARD).policy(FailurePolicy::ContinueOnFailure);

    for resource in PROTECTED_RESOURCES {
        let path = format!("/api/v1/{}", resource);
        workflow = workflow
            .step(
                Step::new(
                    format!("{} without token", resource),
                    RequestTemplate::get(path.clone()),
                )
                .expect(Expectation::status(401)),
            )
            .step(
                Step::new(
                    format!("{} with malformed token", resource),
                    RequestTemplate::get(path).raw_authorization(MALFORMED_TOKEN),
                )
                .expect(Expectation::status(401)),
            );
    }
    workflow.steps(unauthenticated_writes())
}

pub(super) fn public_endpoints(_settings: &WorkflowSettings) -> Workflow {
    let empty_body = |label: &str, path: &str| {
        Step::new(label, RequestTemplate::post(path).json(json!({})))
            .expect(Expectation::status_in(&[400, 422]))
            .expect(Expectation::status_not_in(&[401, 403]))
    };

    Workflow::new(PUBLIC_ENDPOINTS)
        .policy(FailurePolicy::ContinueOnFailure)
        .step(empty_body("signup with empty body", SIGNUP))
        .step(empty_body("login with empty body", LOGIN))
}
