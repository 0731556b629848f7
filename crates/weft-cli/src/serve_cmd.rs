//! `weft serve` command: HTTP API over in-memory building sessions.
//!
//! Each session is a [`Workbench`]; the API creates sessions, feeds plan
//! text (or whole chat turns) into them, and exposes the step log, file
//! tree, and mount structure for a browser frontend. Step transitions
//! stream out over SSE.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use weft_core::planner::prompts::{BASE_PROMPT, system_prompt};
use weft_core::planner::{Planner, TemplateKind, starter_plan};
use weft_core::session::{IngestReport, PlanError};
use weft_core::{ChatMessage, Workbench};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub struct AppState {
    sessions: RwLock<HashMap<Uuid, Arc<Workbench>>>,
    planner: Arc<dyn Planner>,
}

impl AppState {
    pub fn new(planner: Arc<dyn Planner>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            planner,
        }
    }
}

type SharedState = Arc<AppState>;

async fn get_session(state: &AppState, id: Uuid) -> Result<Arc<Workbench>, AppError> {
    state
        .sessions
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("session {id} not found")))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.into(),
        }
    }

    pub fn bad_gateway(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: format!("{err:#}"),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub template: TemplateKind,
    /// Context messages the frontend should carry into its conversation.
    pub prompts: Vec<String>,
    /// Starter plan markup for the chosen template.
    pub starter: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Seed the new session with this starter template.
    #[serde(default)]
    pub template: Option<TemplateKind>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub id: Uuid,
    /// Present when the session was seeded with a starter template.
    pub report: Option<IngestReport>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: Option<String>,
    pub steps: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The raw model reply, markup included.
    pub reply: String,
    /// `None` when the reply contained no build actions (pure prose).
    pub report: Option<IngestReport>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/template", post(choose_template))
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/{id}/plan", post(ingest_plan))
        .route("/api/sessions/{id}/chat", post(chat_turn))
        .route("/api/sessions/{id}/steps", get(session_steps))
        .route("/api/sessions/{id}/tree", get(session_tree))
        .route("/api/sessions/{id}/mount", get(session_mount))
        .route("/api/sessions/{id}/events", get(session_events))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(planner: Arc<dyn Planner>, bind: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(planner));
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("weft serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("weft serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index(State(state): State<SharedState>) -> Result<axum::response::Response, AppError> {
    let sessions: Vec<Arc<Workbench>> = state.sessions.read().await.values().cloned().collect();

    let rows = if sessions.is_empty() {
        "<tr><td colspan=\"3\">No sessions yet.</td></tr>".to_string()
    } else {
        let mut rows = Vec::with_capacity(sessions.len());
        for bench in &sessions {
            let snap = bench.snapshot().await;
            rows.push(format!(
                "<tr><td><a href=\"/api/sessions/{id}/tree\">{title}</a></td><td>{steps}</td><td>{id}</td></tr>",
                id = snap.id,
                title = snap.title.as_deref().unwrap_or("(untitled)"),
                steps = snap.steps.len(),
            ));
        }
        rows.join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>weft</title></head><body>\
<h1>weft</h1>\
<p><a href=\"/api/sessions\">/api/sessions</a></p>\
<table><tr><th>Session</th><th>Steps</th><th>ID</th></tr>{rows}</table>\
</body></html>"
    );

    Ok(Html(html).into_response())
}

async fn choose_template(
    State(state): State<SharedState>,
    Json(req): Json<TemplateRequest>,
) -> Result<axum::response::Response, AppError> {
    let template = state
        .planner
        .classify(&req.prompt)
        .await
        .map_err(AppError::bad_gateway)?;

    let starter = starter_plan(template).to_string();
    Ok(Json(TemplateResponse {
        template,
        prompts: vec![BASE_PROMPT.to_string(), system_prompt()],
        starter,
    })
    .into_response())
}

async fn create_session(
    State(state): State<SharedState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<axum::response::Response, AppError> {
    let bench = Arc::new(Workbench::new());

    let report = match req.template {
        Some(kind) => {
            // Starter templates are embedded and always parse.
            let report = bench
                .ingest_plan(starter_plan(kind))
                .await
                .map_err(|e| AppError::internal(e.into()))?;
            Some(report)
        }
        None => None,
    };

    let id = bench.id();
    state.sessions.write().await.insert(id, bench);
    tracing::info!(session_id = %id, "session created");

    Ok(Json(SessionCreatedResponse { id, report }).into_response())
}

async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<axum::response::Response, AppError> {
    let sessions: Vec<Arc<Workbench>> = state.sessions.read().await.values().cloned().collect();

    let mut summaries = Vec::with_capacity(sessions.len());
    for bench in &sessions {
        let snap = bench.snapshot().await;
        summaries.push(SessionSummary {
            id: snap.id,
            title: snap.title,
            steps: snap.steps.len(),
            created_at: bench.created_at(),
        });
    }
    summaries.sort_by_key(|s| s.created_at);

    Ok(Json(summaries).into_response())
}

async fn ingest_plan(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PlanRequest>,
) -> Result<axum::response::Response, AppError> {
    let bench = get_session(&state, id).await?;

    let report = bench.ingest_plan(&req.text).await.map_err(|e| match e {
        PlanError::EmptyPlan => AppError::unprocessable(e.to_string()),
    })?;

    Ok(Json(report).into_response())
}

async fn chat_turn(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<axum::response::Response, AppError> {
    let bench = get_session(&state, id).await?;

    let mut messages = Vec::with_capacity(req.messages.len() + 1);
    messages.push(ChatMessage::system(system_prompt()));
    messages.extend(req.messages);

    let reply = state
        .planner
        .complete(&messages)
        .await
        .map_err(AppError::bad_gateway)?;

    // A prose-only reply is a valid conversation turn, not an error; it
    // just leaves the session untouched.
    let report = match bench.ingest_plan(&reply).await {
        Ok(report) => Some(report),
        Err(PlanError::EmptyPlan) => None,
    };

    Ok(Json(ChatResponse { reply, report }).into_response())
}

async fn session_steps(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let bench = get_session(&state, id).await?;
    let snap = bench.snapshot().await;
    Ok(Json(snap.steps).into_response())
}

async fn session_tree(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let bench = get_session(&state, id).await?;
    let snap = bench.snapshot().await;
    Ok(Json(snap.tree).into_response())
}

async fn session_mount(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let bench = get_session(&state, id).await?;
    let snap = bench.snapshot().await;
    Ok(Json(snap.mount).into_response())
}

async fn session_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bench = get_session(&state, id).await?;
    let rx = bench.subscribe();

    let stream = BroadcastStream::new(rx)
        // Lagged receivers drop missed events and keep streaming.
        .filter_map(|event| event.ok())
        .map(|event| Event::default().json_data(&event));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
