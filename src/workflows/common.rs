use super::WorkflowSettings;
use crate::harness::{Expectation, RequestTemplate, Step};
use serde_json::json;

pub(super) const SIGNUP: &str = "/api/v1/users/signup";
pub(super) const LOGIN: &str = "/api/v1/users/login";

/// Signs up the identity stored in fixture `who` and checks the echo.
pub fn signup(who: &str) -> Step {
    Step::new(
        format!("sign up {}", who),
        RequestTemplate::post(SIGNUP).json(json!({
            "emailAddress": format!("{{{{{}.email}}}}", who),
            "username": format!("{{{{{}.username}}}}", who),
            "password": format!("{{{{{}.password}}}}", who),
            "roleName": format!("{{{{{}.role}}}}", who),
        })),
    )
    .expect(Expectation::status(201))
    .expect(Expectation::equals_slot("emailAddress", format!("{}.email", who)))
    .expect(Expectation::equals_slot("username", format!("{}.username", who)))
}

/// Logs in as fixture `who` and stores the token in `token_slot`.
pub fn login(who: &str, token_slot: &str, settings: &WorkflowSettings) -> Step {
    Step::new(
        format!("log in {}", who),
        RequestTemplate::post(LOGIN).json(json!({
            "emailAddress": format!("{{{{{}.email}}}}", who),
            "password": format!("{{{{{}.password}}}}", who),
        })),
    )
    .expect(Expectation::status(200))
    .expect(Expectation::non_empty_string("token"))
    .expect(Expectation::has_any(&settings.login_user_paths[..]))
    .capture(token_slot, "token")
}
