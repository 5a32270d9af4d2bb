use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::chat::{self, ChatReply};
use crate::schema::EmployeeSchema;
use crate::web::state::AppState;

// Chat types

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub session_id: String,
    #[serde(default)]
    pub detailed: bool,
}

// System status

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub active_sessions: usize,
    pub schema_version: String,
    pub llm_backend: String,
}

// API Implementations

pub async fn chat(
    state: State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>, (StatusCode, String)> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query must not be empty".to_string()));
    }
    if payload.session_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "session_id must not be empty".to_string()));
    }

    info!("Chat request for session {}", payload.session_id);
    let reply = chat::answer(&state, &payload.session_id, query, payload.detailed).await;
    debug!("Replying with {:?} ({} chars)", reply.response_type, reply.message.len());

    Ok(Json(reply))
}

pub async fn clear_session(
    state: State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    if state.sessions.clear(&session_id).await {
        info!("Cleared session {}", session_id);
    }
    StatusCode::NO_CONTENT
}

pub async fn get_schema(state: State<Arc<AppState>>) -> Json<EmployeeSchema> {
    Json(state.schema.as_ref().clone())
}

pub async fn system_status(state: State<Arc<AppState>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        active_sessions: state.sessions.len().await,
        schema_version: state.schema.version.clone(),
        llm_backend: state.llm_manager.backend().to_string(),
    })
}

pub async fn health() -> &'static str {
    "OK"
}
