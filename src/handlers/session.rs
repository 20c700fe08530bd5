use axum::{
    Json,
    extract::{
        ConnectInfo, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use std::net::SocketAddr;
use tracing::warn;

use crate::app::AppState;
use crate::display::{SessionStatusView, SessionView};
use crate::errors::{SessionError, SessionResult};
use crate::models::{
    LogoutRequest, MessageResponse, SessionListResponse, SessionResponse, StatusQuery,
    UpdateRequest,
};
use crate::net_info::HostInfo;
use crate::session::{IdentityUpdate, NewSession};

/// Client address: proxy headers first, then the socket peer
pub fn extract_origin_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn require_session_id(session_id: Option<String>) -> SessionResult<String> {
    session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SessionError::Validation("Missing required field: sessionId".to_string()))
}

pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<NewSession>, JsonRejection>,
) -> SessionResult<(StatusCode, Json<SessionResponse<SessionView>>)> {
    let Json(payload) = payload?;
    let origin_ip = extract_origin_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let record = state
        .sessions
        .manager
        .create_session(payload, &origin_ip)
        .await?;

    Ok((
        StatusCode::OK,
        Json(SessionResponse {
            message: "Login successful".to_string(),
            session: SessionView::new(&record, state.timezone, HostInfo::detect()),
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> SessionResult<(StatusCode, Json<MessageResponse>)> {
    let Json(payload) = payload?;
    let session_id = require_session_id(payload.session_id)?;

    if let Err(e) = state.sessions.manager.remove_session(&session_id).await {
        warn!("Logout failed for {}: {}", session_id, e);
        return Err(e);
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> SessionResult<(StatusCode, Json<SessionResponse<SessionView>>)> {
    let Json(payload) = payload?;
    let session_id = require_session_id(payload.session_id)?;
    let update = IdentityUpdate {
        email: payload.email,
        nickname: payload.nickname,
        mac_address: payload.mac_address,
    };

    let record = state
        .sessions
        .manager
        .update_session(&session_id, update)
        .await?;

    Ok((
        StatusCode::OK,
        Json(SessionResponse {
            message: "Session updated".to_string(),
            session: SessionView::new(&record, state.timezone, HostInfo::detect()),
        }),
    ))
}

pub async fn status(
    State(state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> SessionResult<(StatusCode, Json<SessionResponse<SessionStatusView>>)> {
    let Query(query) = query?;
    let session_id = require_session_id(query.session_id)?;
    let manager = &state.sessions.manager;

    let record = if state.refresh_on_status {
        manager.touch_session(&session_id).await?
    } else {
        manager.get_session(&session_id).await?
    };

    Ok((
        StatusCode::OK,
        Json(SessionResponse {
            message: "Session status".to_string(),
            session: SessionStatusView::at(&record, Utc::now(), state.timezone, HostInfo::detect()),
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
) -> SessionResult<(StatusCode, Json<SessionListResponse<SessionView>>)> {
    let records = state.sessions.manager.list_sessions().await?;
    let host = HostInfo::detect();

    let sessions: Vec<SessionView> = records
        .iter()
        .map(|record| SessionView::new(record, state.timezone, host.clone()))
        .collect();

    Ok((
        StatusCode::OK,
        Json(SessionListResponse {
            count: sessions.len(),
            sessions,
        }),
    ))
}
