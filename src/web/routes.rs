use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

// API Routes - chat and introspection
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest(
            "/api",
            Router::new()
                // Conversation
                .route("/chat", post(handlers::api::chat))
                .route("/sessions/{session_id}", delete(handlers::api::clear_session))

                // Schema
                .route("/schema", get(handlers::api::get_schema))

                // System status
                .route("/status", get(handlers::api::system_status)),
        )
        .route("/health", get(handlers::api::health))
}
