use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::app::AppState;

pub async fn welcome() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "message": "Welcome to the session registry API",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let active_sessions = state.sessions.manager.session_count().await.ok();

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "active_sessions": active_sessions
        })),
    )
}
