use super::common::{login, signup};
use super::WorkflowSettings;
use crate::harness::{Expectation, RequestTemplate, Step, Workflow};
use crate::identity::{IdentityFactory, Role};
use serde_json::json;

pub(super) const DJ_SESSION_LIFECYCLE: &str = "dj-session-lifecycle";

pub(super) fn dj_session_lifecycle(settings: &WorkflowSettings) -> Workflow {
    let client = settings.identities.identity(Role::Client);
    let dj = settings.identities.identity(Role::Dj);
    let seed = IdentityFactory::next_seed();

    Workflow::new(DJ_SESSION_LIFECYCLE)
        .fixture("client", client.slot_value())
        .fixture("dj", dj.slot_value())
        .fixture("clubName", format!("Test Club {}", seed))
        .fixture("sessionTitle", format!("Friday Night Mix {}", seed))
        .step(signup("dj").capture("djId", "id"))
        .step(login("dj", "djToken", settings))
        .step(signup("client"))
        .step(login("client", "clientToken", settings))
        .step(
            Step::new(
                "DJ creates club",
                RequestTemplate::post("/api/v1/clubs").bearer("djToken").json(json!({
                    "name": "{{clubName}}",
                    "location": "Nairobi",
                    "address": "123 Test Street",
                    "description": "A great place for music",
                    "capacity": 500,
                })),
            )
            .expect(Expectation::status(201))
            .expect(Expectation::equals_slot("name", "clubName"))
            .capture("clubId", "id"),
        )
        .step(
            Step::new(
                "DJ lists clubs",
                RequestTemplate::get("/api/v1/clubs").bearer("djToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::array_contains_slot("", "id", "clubId")),
        )
        .step(
            Step::new(
                "DJ creates session",
                RequestTemplate::post("/api/v1/sessions")
                    .bearer("djToken")
                    .json(json!({
                        "djId": "{{djId}}",
                        "clubId": "{{clubId}}",
                        "type": "CLUB",
                        "title": "{{sessionTitle}}",
                        "description": "Best house music in town",
                        "genres": ["House", "Techno"],
                    })),
            )
            .expect(Expectation::status(201))
            .expect(Expectation::equals_slot("title", "sessionTitle"))
            .capture("sessionId", "id"),
        )
        .step(
            Step::new(
                "DJ starts session",
                RequestTemplate::put("/api/v1/sessions/{{sessionId}}/start").bearer("djToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::equals("status", "LIVE")),
        )
        .step(
            Step::new(
                "client discovers live sessions",
                RequestTemplate::get("/api/v1/sessions/live").bearer("clientToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::array_non_empty(""))
            .expect(Expectation::array_contains_slot("", "id", "sessionId")),
        )
        .step(
            Step::new(
                "client discovers DJs",
                RequestTemplate::get("/api/v1/djs").bearer("clientToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::array_non_empty("")),
        )
        .step(
            Step::new(
                "DJ ends session",
                RequestTemplate::put("/api/v1/sessions/{{sessionId}}/end").bearer("djToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::equals("status", "ENDED")),
        )
        .step(
            Step::new(
                "ended session is no longer live",
                RequestTemplate::get("/api/v1/sessions/live").bearer("clientToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::is_array(""))
            .expect(Expectation::array_lacks_slot("", "id", "sessionId")),
        )
}
