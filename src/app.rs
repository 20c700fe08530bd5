use axum::{
    Router,
    routing::{get, post},
};
use chrono_tz::Tz;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::models::AppConfig;
use crate::session::{MemorySessionStorage, SessionManagerState};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManagerState,
    pub timezone: Tz,
    pub refresh_on_status: bool,
}

impl AppState {
    /// Build state backed by the in-memory session store
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        Ok(Self {
            sessions: SessionManagerState::new(
                Arc::new(MemorySessionStorage::new()),
                config.session.clone(),
            ),
            timezone: config.display_timezone()?,
            refresh_on_status: config.display.refresh_on_status,
        })
    }
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::welcome))
        .route("/health", get(handlers::health::health_check))
        .route("/login", post(handlers::session::login))
        .route("/logout", post(handlers::session::logout))
        .route("/update", post(handlers::session::update))
        .route("/status", get(handlers::session::status))
        .route("/sessions", get(handlers::session::list))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
