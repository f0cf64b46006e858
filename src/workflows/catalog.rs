//! Artist and song catalog workflow.

use super::common::{login, signup};
use super::WorkflowSettings;
use crate::harness::{Expectation, RequestTemplate, Step, Workflow};
use crate::identity::{IdentityFactory, Role};
use serde_json::json;

pub(super) const CATALOG_ROUNDTRIP: &str = "catalog-roundtrip";

const NIL_ID: &str = "00000000-0000-0000-0000-000000000000";
const ARTIST_BIO: &str = "Canadian singer, songwriter, and record producer";

pub(super) fn catalog_roundtrip(settings: &WorkflowSettings) -> Workflow {
    let dj = settings.identities.identity(Role::Dj);
    let seed = IdentityFactory::next_seed();

    Workflow::new(CATALOG_ROUNDTRIP)
        .fixture("dj", dj.slot_value())
        .fixture("artistName", format!("The Weeknd {}", seed))
        .fixture("artistBio", ARTIST_BIO)
        .fixture("songName", format!("Blinding Lights {}", seed))
        .step(signup("dj"))
        .step(login("dj", "djToken", settings))
        .steps(artist_steps())
        .steps(song_steps())
}

fn artist_steps() -> Vec<Step> {
    vec![
        Step::new(
            "create artist",
            RequestTemplate::post("/api/v1/artists")
                .bearer("djToken")
                .multipart([("name", "{{artistName}}"), ("bio", "{{artistBio}}")]),
        )
        .expect(Expectation::status_in(&[200, 201]))
        .expect(Expectation::has("id"))
        .expect(Expectation::equals_slot("name", "artistName"))
        .expect(Expectation::equals_slot("bio", "artistBio"))
        .capture("artistId", "id"),
        Step::new(
            "list artists",
            RequestTemplate::get("/api/v1/artists").bearer("djToken"),
        )
        .expect(Expectation::status(200))
        .expect(Expectation::array_non_empty(""))
        .expect(Expectation::array_contains_slot("", "id", "artistId")),
        Step::new(
            "fetch artist",
            RequestTemplate::get("/api/v1/artists/{{artistId}}").bearer("djToken"),
        )
        .expect(Expectation::status(200))
        .expect(Expectation::equals_slot("id", "artistId"))
        .expect(Expectation::equals_slot("name", "artistName"))
        .expect(Expectation::equals_slot("bio", "artistBio")),
        Step::new(
            "update artist",
            RequestTemplate::put("/api/v1/artists/{{artistId}}")
                .bearer("djToken")
                .multipart([
                    ("name", "Updated {{artistName}}"),
                    ("bio", "Updated bio for test artist"),
                ]),
        )
        .expect(Expectation::status(200))
        .expect(Expectation::equals("bio", "Updated bio for test artist")),
        Step::new(
            "fetch missing artist",
            RequestTemplate::get(format!("/api/v1/artists/{}", NIL_ID)).bearer("djToken"),
        )
        .expect(Expectation::status(404)),
    ]
}

fn song_steps() -> Vec<Step> {
    vec![
        Step::new(
            "create song",
            RequestTemplate::post("/api/v1/songs").bearer("djToken").json(json!({
                "name": "{{songName}}",
                "artistId": "{{artistId}}",
                "album": "After Hours",
            })),
        )
        .expect(Expectation::status(201))
        .expect(Expectation::has("id"))
        .expect(Expectation::equals_slot("name", "songName"))
        .expect(Expectation::equals_slot("artistId", "artistId"))
        .expect(Expectation::equals("album", "After Hours"))
        .capture("songId", "id"),
        Step::new(
            "list songs",
            RequestTemplate::get("/api/v1/songs").bearer("djToken"),
        )
        .expect(Expectation::status(200))
        .expect(Expectation::array_contains_slot("", "id", "songId")),
        Step::new(
            "fetch song",
            RequestTemplate::get("/api/v1/songs/{{songId}}").bearer("djToken"),
        )
        .expect(Expectation::status(200))
        .expect(Expectation::equals_slot("id", "songId"))
        .expect(Expectation::equals_slot("name", "songName"))
        .expect(Expectation::equals_slot("artistId", "artistId"))
        .expect(Expectation::equals("album", "After Hours")),
        Step::new(
            "update song",
            RequestTemplate::put("/api/v1/songs/{{songId}}")
                .bearer("djToken")
                .json(json!({
                    "name": "Updated {{songName}}",
                    "artistId": "{{artistId}}",
                    "album": "Updated After Hours",
                })),
        )
        .expect(Expectation::status(200))
        .expect(Expectation::equals("album", "Updated After Hours")),
        Step::new(
            "create song for unknown artist",
            RequestTemplate::post("/api/v1/songs").bearer("djToken").json(json!({
                "name": "{{songName}}",
                "artistId": NIL_ID,
                "album": "After Hours",
            })),
        )
        .expect(Expectation::status(400)),
        Step::new(
            "create song without fields",
            RequestTemplate::post("/api/v1/songs")
                .bearer("djToken")
                .json(json!({"album": "After Hours"})),
        )
        .expect(Expectation::status(400)),
        Step::new(
            "delete song",
            RequestTemplate::delete("/api/v1/songs/{{songId}}").bearer("djToken"),
        )
        .expect(Expectation::status(204)),
        Step::new(
            "fetch deleted song",
            RequestTemplate::get("/api/v1/songs/{{songId}}").bearer("djToken"),
        )
        .expect(Expectation::status(404)),
    ]
}
