//! In-process mock of the notes API for integration tests.
//!
//! The mock binds to an ephemeral port on 127.0.0.1 and serves the same
//! routes as the real service under `/api`. Tests seed and inspect its state
//! directly through [`MockApi::state`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::Notify;

use notekeeper::api::ApiClient;
use notekeeper::models::*;
use notekeeper::session::SessionContext;
use notekeeper::storage::SqliteStore;

type Shared = Arc<Mutex<MockState>>;
type ApiResult<T> = Result<T, (StatusCode, String)>;

#[derive(Default)]
pub struct MockState {
    pub users: Vec<(User, String)>,
    pub notes: Vec<Note>,
    pub tokens: HashMap<String, i64>,
    /// `"METHOD /path"` for every request served, in order.
    pub requests: Vec<String>,
    /// Authorization header of the most recent request.
    pub last_authorization: Option<String>,
    /// `search` query parameter of the most recent list request.
    pub last_search: Option<String>,
    /// Answer the next notes request with this status instead.
    pub fail_next: Option<StatusCode>,
    /// When set, login and list requests are recorded and then held until
    /// the gate is notified.
    pub gate: Option<Arc<Notify>>,
    next_id: i64,
    clock: i64,
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps, one minute apart.
    fn tick(&mut self) -> String {
        self.clock += 1;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (base + Duration::minutes(self.clock)).to_rfc3339()
    }

    pub fn add_user(&mut self, email: &str, password: &str, first: &str, last: &str) -> User {
        let user = User {
            id: self.next_id(),
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            created_at: self.tick(),
        };
        self.users.push((user.clone(), password.to_string()));
        user
    }

    pub fn issue_token(&mut self, user_id: i64) -> String {
        let token = format!("t{}", self.tokens.len() + 1);
        self.tokens.insert(token.clone(), user_id);
        token
    }

    pub fn add_note(&mut self, user_id: i64, title: &str, content: &str) -> Note {
        let now = self.tick();
        let note = Note {
            id: self.next_id(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now.clone(),
            updated_at: now,
            user_id,
        };
        self.notes.push(note.clone());
        note
    }
}

pub struct MockApi {
    pub url: String,
    pub state: Shared,
}

impl MockApi {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API");
        let addr = listener.local_addr().expect("Failed to read mock address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock API crashed");
        });

        Self {
            url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }
}

/// A mock server plus a client wired to fresh in-memory storage.
pub struct Harness {
    pub mock: MockApi,
    pub storage: SqliteStore,
    pub session: SessionContext,
    pub client: ApiClient,
}

pub async fn harness() -> Harness {
    let mock = MockApi::spawn().await;
    let storage = SqliteStore::open_memory().expect("Failed to open storage");
    storage.migrate().expect("Failed to migrate storage");
    let session = SessionContext::new(Arc::new(storage.clone()));
    let client = ApiClient::new(mock.url.clone(), session.clone());
    Harness {
        mock,
        storage,
        session,
        client,
    }
}

/// Seed a user and log the harness in as them without going through the API.
pub fn sign_in(h: &Harness, email: &str) -> User {
    let (user, token) = {
        let mut state = h.mock.state();
        let user = state.add_user(email, "secret", "Ada", "Lovelace");
        let token = state.issue_token(user.id);
        (user, token)
    };
    h.session.establish(&AuthResponse {
        token,
        user: user.clone(),
    });
    user
}

// ============================================================
// Routes
// ============================================================

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        );

    Router::new().nest("/api", api).with_state(state)
}

fn record(state: &mut MockState, line: String, headers: &HeaderMap) {
    state.requests.push(line);
    state.last_authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
}

/// Record the request, then park on the gate if one is installed.
async fn record_and_hold(state: &Shared, line: String, headers: &HeaderMap) {
    let gate = {
        let mut state = state.lock().unwrap();
        record(&mut state, line, headers);
        state.gate.clone()
    };
    if let Some(gate) = gate {
        gate.notified().await;
    }
}

/// Resolve the bearer token to a user id, honouring `fail_next`.
fn authorize(state: &mut MockState, headers: &HeaderMap) -> ApiResult<i64> {
    if let Some(status) = state.fail_next.take() {
        return Err((status, "forced failure".to_string()));
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| state.tokens.get(token).copied())
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string()))
}

async fn login(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(input): Json<LoginInput>,
) -> ApiResult<Json<AuthResponse>> {
    record_and_hold(&state, "POST /auth/login".to_string(), &headers).await;
    let mut state = state.lock().unwrap();

    let user = state
        .users
        .iter()
        .find(|(u, p)| u.email == input.email && *p == input.password)
        .map(|(u, _)| u.clone())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        ))?;
    let token = state.issue_token(user.id);
    Ok(Json(AuthResponse { token, user }))
}

async fn register(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(input): Json<RegisterInput>,
) -> ApiResult<Json<AuthResponse>> {
    let mut state = state.lock().unwrap();
    record(&mut state, "POST /auth/register".to_string(), &headers);

    if state.users.iter().any(|(u, _)| u.email == input.email) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Email is already registered".to_string(),
        ));
    }
    let user = state.add_user(
        &input.email,
        &input.password,
        &input.first_name,
        &input.last_name,
    );
    let token = state.issue_token(user.id);
    Ok(Json(AuthResponse { token, user }))
}

#[derive(Deserialize)]
struct ListParams {
    search: Option<String>,
}

async fn list_notes(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Note>>> {
    record_and_hold(&state, "GET /notes".to_string(), &headers).await;
    let mut state = state.lock().unwrap();
    state.last_search = params.search.clone();
    let user_id = authorize(&mut state, &headers)?;

    let needle = params.search.unwrap_or_default().to_lowercase();
    let notes = state
        .notes
        .iter()
        .filter(|n| n.user_id == user_id)
        .filter(|n| needle.is_empty() || n.matches(&needle))
        .cloned()
        .collect();
    Ok(Json(notes))
}

async fn get_note(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Note>> {
    let mut state = state.lock().unwrap();
    record(&mut state, format!("GET /notes/{}", id), &headers);
    let user_id = authorize(&mut state, &headers)?;

    let note = state
        .notes
        .iter()
        .find(|n| n.id == id && n.user_id == user_id)
        .cloned()
        .ok_or((StatusCode::NOT_FOUND, "Note not found".to_string()))?;
    Ok(Json(note))
}

async fn create_note(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(input): Json<CreateNoteInput>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let mut state = state.lock().unwrap();
    record(&mut state, "POST /notes".to_string(), &headers);
    let user_id = authorize(&mut state, &headers)?;

    let note = state.add_note(user_id, &input.title, &input.content);
    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_note(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<UpdateNoteInput>,
) -> ApiResult<Json<Note>> {
    let mut state = state.lock().unwrap();
    record(&mut state, format!("PUT /notes/{}", id), &headers);
    let user_id = authorize(&mut state, &headers)?;

    let now = state.tick();
    let note = state
        .notes
        .iter_mut()
        .find(|n| n.id == id && n.user_id == user_id)
        .ok_or((StatusCode::NOT_FOUND, "Note not found".to_string()))?;
    note.title = input.title;
    note.content = input.content;
    note.updated_at = now;
    Ok(Json(note.clone()))
}

async fn delete_note(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let mut state = state.lock().unwrap();
    record(&mut state, format!("DELETE /notes/{}", id), &headers);
    let user_id = authorize(&mut state, &headers)?;

    let before = state.notes.len();
    state.notes.retain(|n| !(n.id == id && n.user_id == user_id));
    if state.notes.len() == before {
        return Err((StatusCode::NOT_FOUND, "Note not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
