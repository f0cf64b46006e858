//! Song request workflows.

use super::common::{login, signup};
use super::WorkflowSettings;
use crate::harness::{Expectation, LengthPredicate, RequestTemplate, Step, Workflow};
use crate::identity::{IdentityFactory, Role};
use serde_json::json;

pub(super) const SONG_REQUEST_JOURNEY: &str = "song-request-journey";
pub(super) const CONCURRENT_REQUESTS: &str = "concurrent-requests";
pub(super) const UNKNOWN_DJ_REQUEST: &str = "unknown-dj-request";

/// A client and a DJ, both logged in, and a song the DJ added.
fn with_song(name: &str, settings: &WorkflowSettings) -> Workflow {
    let client = settings.identities.identity(Role::Client);
    let dj = settings.identities.identity(Role::Dj);
    let seed = IdentityFactory::next_seed();

    Workflow::new(name)
        .fixture("client", client.slot_value())
        .fixture("dj", dj.slot_value())
        .fixture("artistName", format!("The Weeknd {}", seed))
        .step(signup("client"))
        .step(login("client", "clientToken", settings))
        .step(signup("dj"))
        .step(login("dj", "djToken", settings))
        .step(
            Step::new(
                "DJ creates artist",
                RequestTemplate::post("/api/v1/artists")
                    .bearer("djToken")
                    .multipart([
                        ("name", "{{artistName}}"),
                        ("bio", "Canadian singer, songwriter, and record producer"),
                    ]),
            )
            .expect(Expectation::status_in(&[200, 201]))
            .capture("artistId", "id"),
        )
        .step(
            Step::new(
                "DJ adds song",
                RequestTemplate::post("/api/v1/songs").bearer("djToken").json(json!({
                    "name": "Blinding Lights",
                    "artistId": "{{artistId}}",
                    "album": "After Hours",
                })),
            )
            .expect(Expectation::status(201))
            .capture("songId", "id"),
        )
}

fn request_song() -> RequestTemplate {
    RequestTemplate::post("/api/v1/requests")
        .bearer("clientToken")
        .json(json!({
            "djEmailAddress": "{{dj.email}}",
            "songId": "{{songId}}",
        }))
}

pub(super) fn song_request_journey(settings: &WorkflowSettings) -> Workflow {
    with_song(SONG_REQUEST_JOURNEY, settings)
        .step(
            Step::new(
                "client browses songs",
                RequestTemplate::get("/api/v1/songs").bearer("clientToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::array_non_empty(""))
            .expect(Expectation::array_contains_slot("", "id", "songId")),
        )
        .step(
            Step::new("client requests song", request_song())
                .expect(Expectation::status(201))
                .expect(Expectation::has("id"))
                .expect_soft(Expectation::equals_slot("songResponse.0.id", "songId"))
                .capture("requestId", "id"),
        )
        .step(
            Step::new(
                "DJ views requests",
                RequestTemplate::get("/api/v1/requests").bearer("djToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::array_non_empty(""))
            .expect(Expectation::array_contains_slot("", "id", "requestId")),
        )
        .step(
            Step::new(
                "DJ marks request done",
                RequestTemplate::put("/api/v1/requests/{{requestId}}/done").bearer("djToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::equals("status", true)),
        )
        .step(
            Step::new(
                "client verifies artist",
                RequestTemplate::get("/api/v1/artists/{{artistId}}").bearer("clientToken"),
            )
            .expect(Expectation::status(200)),
        )
        .step(
            Step::new(
                "client verifies song",
                RequestTemplate::get("/api/v1/songs/{{songId}}").bearer("clientToken"),
            )
            .expect(Expectation::status(200)),
        )
        .step(
            Step::new(
                "client verifies request",
                RequestTemplate::get("/api/v1/requests/{{requestId}}").bearer("clientToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::equals_slot("id", "requestId"))
            .expect(Expectation::equals("status", true))
            .capture("finalRequest", ""),
        )
}

pub(super) fn concurrent_requests(settings: &WorkflowSettings) -> Workflow {
    let count = settings.concurrency;

    with_song(CONCURRENT_REQUESTS, settings)
        .step(
            Step::new(format!("{} concurrent song requests", count), request_song())
                .expect(Expectation::status(201))
                .fan_out(count)
                .distinct("id"),
        )
        .step(
            Step::new(
                "DJ sees every request",
                RequestTemplate::get("/api/v1/requests").bearer("djToken"),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::array_len("", LengthPredicate::AtLeast(count))),
        )
}

pub(super) fn unknown_dj_request(settings: &WorkflowSettings) -> Workflow {
    with_song(UNKNOWN_DJ_REQUEST, settings)
        .fixture("unknownDj", settings.identities.unknown_email())
        .step(
            Step::new(
                "request song from unknown DJ",
                RequestTemplate::post("/api/v1/requests")
                    .bearer("clientToken")
                    .json(json!({
                        "djEmailAddress": "{{unknownDj}}",
                        "songId": "{{songId}}",
                    })),
            )
            .expect(Expectation::status(404)),
        )
        .step(
            Step::new(
                "request song without song id",
                RequestTemplate::post("/api/v1/requests")
                    .bearer("clientToken")
                    .json(json!({"djEmailAddress": "{{dj.email}}"})),
            )
            .expect(Expectation::status_not_in(&[200, 201])),
        )
}
