//! Common test utilities and helpers
//!
//! [`StubBackend`] is an in-process axum server speaking the feedback
//! backend's HTTP contract. Every request is recorded so tests can assert on
//! exactly what the client sent.

#![allow(dead_code)]

use axum::extract::{Form, Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use feedback_dash_core::{HttpFeedbackApi, SessionGuard};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "test-token";
pub const REPORT_MONTH: &str = "2024-03";
pub const REPORT_BYTES: &[u8] = b"%PDF-1.4\n% monthly report\n";

/// One request as seen by the stub
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct StubState {
    pub requests: Mutex<Vec<Recorded>>,
    /// Reject every token, as if it had expired server-side
    pub revoked: AtomicBool,
    /// Answer the metrics endpoint with a 500
    pub fail_metrics: AtomicBool,
    /// Park report requests until `release` is notified
    pub hold_reports: AtomicBool,
    /// Park insight requests until `release` is notified, then reject their token
    pub reject_held_insight: AtomicBool,
    pub release: Notify,
    notes: Mutex<HashMap<i64, Vec<Value>>>,
    next_note: AtomicI64,
}

pub struct StubBackend {
    pub url: String,
    pub state: Arc<StubState>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/auth/token", axum::routing::post(token))
            .route("/analytics/dashboard", get(dashboard))
            .route("/analytics/weekly-insight", get(weekly_insight))
            .route("/analytics/report/:month", get(report))
            .route("/reviews/", get(list_reviews).post(create_review))
            .route("/reviews/:id/notes", get(list_notes).post(create_note))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests whose path starts with `prefix`
    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }

    pub fn client(&self, session: Arc<SessionGuard>) -> Arc<HttpFeedbackApi> {
        Arc::new(HttpFeedbackApi::new(&self.url, Duration::from_secs(5), session).unwrap())
    }

    /// Session persisted under `dir`, logged in against this stub
    pub async fn login(&self, dir: &FsPath) -> (Arc<SessionGuard>, Arc<HttpFeedbackApi>) {
        let session = Arc::new(SessionGuard::persistent(dir.join("session.token")).unwrap());
        let api = self.client(session.clone());
        api.login(USERNAME, PASSWORD).await.unwrap();
        (session, api)
    }
}

async fn record(State(state): State<Arc<StubState>>, request: Request, next: Next) -> Response {
    state.requests.lock().unwrap().push(Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
    next.run(request).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn authorize(state: &StubState, headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TOKEN}");
    let presented = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if presented == Some(expected.as_str()) && !state.revoked.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    let valid = form.get("username").map(String::as_str) == Some(USERNAME)
        && form.get("password").map(String::as_str) == Some(PASSWORD);
    if valid {
        Json(json!({ "access_token": TOKEN, "token_type": "bearer" })).into_response()
    } else {
        detail(StatusCode::UNAUTHORIZED, "Incorrect username or password")
    }
}

async fn dashboard(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    if state.fail_metrics.load(Ordering::SeqCst) {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }
    Json(json!({
        "total_reviews": 2,
        "average_rating": 3.0,
        "rating_distribution": {"1": 0, "2": 1, "3": 0, "4": 1, "5": 0},
        "monthly_trend": [
            {"month": "2024-03", "count": 2, "avg_rating": 3.0, "positive": 1, "neutral": 0, "negative": 1}
        ]
    }))
    .into_response()
}

async fn weekly_insight(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    if state.reject_held_insight.load(Ordering::SeqCst) {
        state.release.notified().await;
        return detail(StatusCode::UNAUTHORIZED, "Token has expired");
    }
    Json(json!({ "summary": "Wait times improved 12% over last week." })).into_response()
}

async fn report(
    State(state): State<Arc<StubState>>,
    Path(month): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    if state.hold_reports.load(Ordering::SeqCst) {
        state.release.notified().await;
    }
    if month != REPORT_MONTH {
        return detail(StatusCode::NOT_FOUND, "No data for this month");
    }
    ([(CONTENT_TYPE, "application/pdf")], REPORT_BYTES).into_response()
}

pub fn review_json(id: i64, rating: u8, content: &str, aspects: &str) -> Value {
    json!({
        "id": id,
        "rating": rating,
        "content": content,
        "response": "Thank you for the feedback.",
        "summary": "Customer comment",
        "suggestedAction": null,
        "sentiment": if rating >= 4 { "Positive" } else { "Negative" },
        "aspects": aspects,
        "createdAt": "2024-03-02T10:00:00"
    })
}

async fn list_reviews(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    Json(json!([
        review_json(2, 4, "Great food", r#"["Food"]"#),
        review_json(1, 2, "Slow service", "not valid json"),
    ]))
    .into_response()
}

async fn create_review(Json(body): Json<Value>) -> Response {
    let rating = body["rating"].as_u64().unwrap_or(0) as u8;
    let content = body["content"].as_str().unwrap_or_default();
    (StatusCode::OK, Json(review_json(99, rating, content, "[]"))).into_response()
}

async fn list_notes(
    State(state): State<Arc<StubState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let notes = state.notes.lock().unwrap().get(&id).cloned().unwrap_or_default();
    Json(Value::Array(notes)).into_response()
}

async fn create_note(
    State(state): State<Arc<StubState>>,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let Some(content) = query.get("note_content") else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "note_content is required");
    };
    let note_id = state.next_note.fetch_add(1, Ordering::SeqCst) + 1;
    let note = json!({
        "id": note_id,
        "review_id": id,
        "admin_id": 1,
        "content": content,
        "created_at": format!("2024-03-0{}T09:00:00", note_id.min(9)),
    });
    // Newest first, as the backend orders them
    state
        .notes
        .lock()
        .unwrap()
        .entry(id)
        .or_default()
        .insert(0, note.clone());
    Json(note).into_response()
}
