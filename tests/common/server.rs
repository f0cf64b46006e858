//! In-process mock of the SpinWish API
//!
//! Implements just enough of the backend for the built-in workflows:
//! signup/login with bearer tokens, artists (multipart), songs, song
//! requests, clubs, DJ sessions and the DJ directory. Every test gets its
//! own server with empty storage.

use super::constants::*;
use axum::extract::{FromRequestParts, Multipart, Path, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use uuid::Uuid;

/// Behaviour switches for failure-path tests.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Field holding the user record in login responses.
    pub login_user_field: &'static str,
    /// Every created song request gets the same id.
    pub duplicate_request_ids: bool,
    /// `GET /api/v1/songs` leaves out every song.
    pub hide_song_listing: bool,
    /// Ended sessions stay in `GET /api/v1/sessions/live`.
    pub keep_ended_sessions_live: bool,
    /// Song requests without a `songId` are accepted.
    pub accept_requests_without_song: bool,
    /// Serves `/actuator/health`; 404 otherwise.
    pub actuator_health: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            login_user_field: "userDetails",
            duplicate_request_ids: false,
            hide_song_listing: false,
            keep_ended_sessions_live: false,
            accept_requests_without_song: false,
            actuator_health: true,
        }
    }
}

#[derive(Debug, Clone)]
struct User {
    id: String,
    email: String,
    username: String,
    password: String,
    role: String,
}

impl User {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "emailAddress": self.email,
            "username": self.username,
            "roleName": self.role,
        })
    }
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    tokens: HashMap<String, String>,
    artists: BTreeMap<String, Value>,
    songs: BTreeMap<String, Value>,
    requests: Vec<Value>,
    clubs: Vec<Value>,
    sessions: BTreeMap<String, Value>,
}

#[derive(Clone)]
struct MockState {
    store: Arc<Mutex<Store>>,
    options: Arc<MockOptions>,
}

impl MockState {
    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn id_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Authenticated caller, resolved from `Authorization: Bearer <token>`.
struct Session {
    email: String,
}

impl FromRequestParts<MockState> for Session {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &MockState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let email = token.and_then(|t| state.store().tokens.get(&t).cloned());
        match email {
            Some(email) => Ok(Session { email }),
            None => Err(error(StatusCode::UNAUTHORIZED, "Unauthorized")),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

async fn signup(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let (Some(email), Some(username), Some(password), Some(role)) = (
        text_field(&body, "emailAddress"),
        text_field(&body, "username"),
        text_field(&body, "password"),
        text_field(&body, "roleName"),
    ) else {
        return error(StatusCode::BAD_REQUEST, "Missing required fields");
    };
    if role != "CLIENT" && role != "DJ" {
        return error(StatusCode::BAD_REQUEST, "Unknown role");
    }

    let mut store = state.store();
    if store.users.iter().any(|u| u.email == email) {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        username,
        password,
        role,
    };
    let response = user.to_json();
    store.users.push(user);
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let (Some(email), Some(password)) = (
        text_field(&body, "emailAddress"),
        text_field(&body, "password"),
    ) else {
        return error(StatusCode::BAD_REQUEST, "Missing credentials");
    };

    let mut store = state.store();
    let Some(user) = store
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .cloned()
    else {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    };

    let token = format!("tok-{}", Uuid::new_v4());
    store.tokens.insert(token.clone(), user.email.clone());

    let mut response = json!({ "token": token });
    response[state.options.login_user_field] = user.to_json();
    Json(response).into_response()
}

async fn list_users(State(state): State<MockState>, _session: Session) -> Response {
    let users: Vec<Value> = state.store().users.iter().map(User::to_json).collect();
    Json(users).into_response()
}

async fn list_roles(_session: Session) -> Response {
    Json(json!([{ "roleName": "CLIENT" }, { "roleName": "DJ" }])).into_response()
}

async fn list_djs(State(state): State<MockState>, _session: Session) -> Response {
    let djs: Vec<Value> = state
        .store()
        .users
        .iter()
        .filter(|u| u.role == "DJ")
        .map(User::to_json)
        .collect();
    Json(djs).into_response()
}

// ============================================================================
// Artists
// ============================================================================

async fn read_form(mut multipart: Multipart) -> Result<HashMap<String, String>, Response> {
    let mut fields = HashMap::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return Err(error(StatusCode::BAD_REQUEST, "Malformed multipart body")),
        };
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|_| error(StatusCode::BAD_REQUEST, "Malformed multipart field"))?;
        fields.insert(name, value);
    }
    Ok(fields)
}

async fn create_artist(
    State(state): State<MockState>,
    _session: Session,
    multipart: Multipart,
) -> Response {
    let fields = match read_form(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let Some(name) = fields.get("name").filter(|n| !n.is_empty()) else {
        return error(StatusCode::BAD_REQUEST, "Artist name is required");
    };

    let id = Uuid::new_v4().to_string();
    let artist = json!({
        "id": id,
        "name": name,
        "bio": fields.get("bio").cloned().unwrap_or_default(),
        "imageUrl": null,
    });
    state.store().artists.insert(id, artist.clone());
    Json(artist).into_response()
}

async fn update_artist(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let fields = match read_form(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let mut store = state.store();
    let Some(artist) = store.artists.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Artist not found");
    };
    for key in ["name", "bio"] {
        if let Some(value) = fields.get(key) {
            artist[key] = json!(value);
        }
    }
    Json(artist.clone()).into_response()
}

async fn list_artists(State(state): State<MockState>, _session: Session) -> Response {
    let artists: Vec<Value> = state.store().artists.values().cloned().collect();
    Json(artists).into_response()
}

async fn get_artist(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
) -> Response {
    match state.store().artists.get(&id) {
        Some(artist) => Json(artist.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Artist not found"),
    }
}

// ============================================================================
// Songs
// ============================================================================

fn song_from(body: &Value, id: String, store: &Store) -> Result<Value, Response> {
    let (Some(name), Some(artist_id)) = (text_field(body, "name"), id_field(body, "artistId"))
    else {
        return Err(error(StatusCode::BAD_REQUEST, "name and artistId are required"));
    };
    if !store.artists.contains_key(&artist_id) {
        return Err(error(StatusCode::BAD_REQUEST, "Unknown artist"));
    }
    Ok(json!({
        "id": id,
        "name": name,
        "artistId": artist_id,
        "album": body.get("album").cloned().unwrap_or(Value::Null),
    }))
}

async fn create_song(
    State(state): State<MockState>,
    _session: Session,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store();
    let id = Uuid::new_v4().to_string();
    match song_from(&body, id.clone(), &store) {
        Ok(song) => {
            store.songs.insert(id, song.clone());
            (StatusCode::CREATED, Json(song)).into_response()
        }
        Err(response) => response,
    }
}

async fn list_songs(State(state): State<MockState>, _session: Session) -> Response {
    if state.options.hide_song_listing {
        return Json(json!([])).into_response();
    }
    let songs: Vec<Value> = state.store().songs.values().cloned().collect();
    Json(songs).into_response()
}

async fn get_song(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
) -> Response {
    match state.store().songs.get(&id) {
        Some(song) => Json(song.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Song not found"),
    }
}

async fn update_song(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store();
    if !store.songs.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "Song not found");
    }
    match song_from(&body, id.clone(), &store) {
        Ok(song) => {
            store.songs.insert(id, song.clone());
            Json(song).into_response()
        }
        Err(response) => response,
    }
}

async fn delete_song(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
) -> Response {
    match state.store().songs.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, "Song not found"),
    }
}

// ============================================================================
// Song requests
// ============================================================================

async fn create_request(
    State(state): State<MockState>,
    session: Session,
    Json(body): Json<Value>,
) -> Response {
    let Some(dj_email) = text_field(&body, "djEmailAddress") else {
        return error(StatusCode::BAD_REQUEST, "djEmailAddress is required");
    };
    let song_id = id_field(&body, "songId");
    if song_id.is_none() && !state.options.accept_requests_without_song {
        return error(StatusCode::BAD_REQUEST, "songId is required");
    }

    let mut store = state.store();
    if !store.users.iter().any(|u| u.email == dj_email && u.role == "DJ") {
        return error(StatusCode::NOT_FOUND, "DJ not found");
    }
    let songs = match song_id {
        Some(id) => match store.songs.get(&id) {
            Some(song) => vec![song.clone()],
            None => return error(StatusCode::NOT_FOUND, "Song not found"),
        },
        None => Vec::new(),
    };

    let id = if state.options.duplicate_request_ids {
        "duplicate".to_string()
    } else {
        Uuid::new_v4().to_string()
    };
    let request = json!({
        "id": id,
        "clientEmailAddress": session.email,
        "djEmailAddress": dj_email,
        "status": false,
        "songResponse": songs,
    });
    store.requests.push(request.clone());
    (StatusCode::CREATED, Json(request)).into_response()
}

async fn list_requests(State(state): State<MockState>, _session: Session) -> Response {
    Json(state.store().requests.clone()).into_response()
}

async fn get_request(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
) -> Response {
    match state.store().requests.iter().find(|r| r["id"] == id.as_str()) {
        Some(request) => Json(request.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Request not found"),
    }
}

async fn mark_request_done(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
) -> Response {
    let mut store = state.store();
    match store.requests.iter_mut().find(|r| r["id"] == id.as_str()) {
        Some(request) => {
            request["status"] = json!(true);
            Json(request.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Request not found"),
    }
}

// ============================================================================
// Clubs and sessions
// ============================================================================

async fn create_club(
    State(state): State<MockState>,
    _session: Session,
    Json(body): Json<Value>,
) -> Response {
    let Some(name) = text_field(&body, "name") else {
        return error(StatusCode::BAD_REQUEST, "Club name is required");
    };
    let mut club = body.clone();
    club["id"] = json!(Uuid::new_v4().to_string());
    club["name"] = json!(name);
    state.store().clubs.push(club.clone());
    (StatusCode::CREATED, Json(club)).into_response()
}

async fn list_clubs(State(state): State<MockState>, _session: Session) -> Response {
    Json(state.store().clubs.clone()).into_response()
}

async fn create_session(
    State(state): State<MockState>,
    _session: Session,
    Json(body): Json<Value>,
) -> Response {
    let (Some(_dj_id), Some(title)) = (id_field(&body, "djId"), text_field(&body, "title")) else {
        return error(StatusCode::BAD_REQUEST, "djId and title are required");
    };
    let id = Uuid::new_v4().to_string();
    let mut session = body.clone();
    session["id"] = json!(id);
    session["title"] = json!(title);
    session["status"] = json!("PREPARING");
    state.store().sessions.insert(id, session.clone());
    (StatusCode::CREATED, Json(session)).into_response()
}

async fn list_sessions(State(state): State<MockState>, _session: Session) -> Response {
    let sessions: Vec<Value> = state.store().sessions.values().cloned().collect();
    Json(sessions).into_response()
}

async fn live_sessions(State(state): State<MockState>, _session: Session) -> Response {
    let live: Vec<Value> = state
        .store()
        .sessions
        .values()
        .filter(|s| s["status"] == "LIVE")
        .cloned()
        .collect();
    Json(live).into_response()
}

fn set_session_status(state: &MockState, id: &str, status: &str) -> Response {
    let mut store = state.store();
    match store.sessions.get_mut(id) {
        Some(session) => {
            session["status"] = json!(status);
            Json(session.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Session not found"),
    }
}

async fn start_session(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
) -> Response {
    set_session_status(&state, &id, "LIVE")
}

async fn end_session(
    State(state): State<MockState>,
    _session: Session,
    Path(id): Path<String>,
) -> Response {
    if state.options.keep_ended_sessions_live {
        // Report the end but leave the stored session live
        return match state.store().sessions.get(&id) {
            Some(session) => {
                let mut ended = session.clone();
                ended["status"] = json!("ENDED");
                Json(ended).into_response()
            }
            None => error(StatusCode::NOT_FOUND, "Session not found"),
        };
    }
    set_session_status(&state, &id, "ENDED")
}

// ============================================================================
// Failure injection
// ============================================================================

async fn actuator_health(State(state): State<MockState>) -> Response {
    if state.options.actuator_health {
        Json(json!({ "status": "UP" })).into_response()
    } else {
        error(StatusCode::NOT_FOUND, "Not Found")
    }
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_millis(SLOW_RESPONSE_MS)).await;
    Json(json!({ "ok": true })).into_response()
}

async fn garbled() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>Whitelabel Error Page</body></html>",
    )
        .into_response()
}

fn make_app(state: MockState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/actuator/health", get(actuator_health))
        .route("/api/v1/users/signup", post(signup))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/roles", get(list_roles))
        .route("/api/v1/djs", get(list_djs))
        .route("/api/v1/artists", get(list_artists).post(create_artist))
        .route("/api/v1/artists/{id}", get(get_artist).put(update_artist))
        .route("/api/v1/songs", get(list_songs).post(create_song))
        .route(
            "/api/v1/songs/{id}",
            get(get_song).put(update_song).delete(delete_song),
        )
        .route("/api/v1/requests", get(list_requests).post(create_request))
        .route("/api/v1/requests/{id}", get(get_request))
        .route("/api/v1/requests/{id}/done", put(mark_request_done))
        .route("/api/v1/clubs", get(list_clubs).post(create_club))
        .route("/api/v1/sessions", get(list_sessions).post(create_session))
        .route("/api/v1/sessions/live", get(live_sessions))
        .route("/api/v1/sessions/{id}/start", put(start_session))
        .route("/api/v1/sessions/{id}/end", put(end_session))
        .route(SLOW_PATH, get(slow))
        .route(GARBLED_PATH, get(garbled))
        .with_state(state)
}

/// Mock SpinWish server bound to a random local port
///
/// When dropped, the server gracefully shuts down.
pub struct MockServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockOptions::default()).await
    }

    /// Spawns a mock server with the given behaviour switches
    ///
    /// # Panics
    ///
    /// Panics if the port cannot be bound or the server does not become
    /// ready within `SERVER_READY_TIMEOUT_MS`.
    pub async fn spawn_with(options: MockOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = make_app(MockState {
            store: Arc::new(Mutex::new(Store::default())),
            options: Arc::new(options),
        });

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Mock server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
