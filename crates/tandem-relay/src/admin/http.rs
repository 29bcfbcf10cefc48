//! Admin HTTP API.
//!
//! Four routes, all token-gated except `login`. Monitor and stop-monitor ack
//! success even when the chat is already gone: sessions race against
//! disconnection, so the list an admin clicks on is always slightly stale.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use tandem_core::protocol::{
    AckResponse, ChatsQuery, ChatsResponse, LoginRequest, LoginResponse, MonitorRequest,
};

use crate::app_state::AppState;

pub async fn login(
    State(app): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<LoginResponse>) {
    if req.password != app.cfg().admin.password {
        tracing::warn!("admin login rejected");
        return (
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                success: false,
                session_id: None,
                message: Some("invalid password".into()),
            }),
        );
    }

    let token = app.admin_hub().mint();
    tracing::info!("admin session opened");
    (
        StatusCode::OK,
        Json(LoginResponse { success: true, session_id: Some(token), message: None }),
    )
}

pub async fn videochats(
    State(app): State<AppState>,
    Query(q): Query<ChatsQuery>,
) -> (StatusCode, Json<ChatsResponse>) {
    if !app.admin_hub().is_valid(q.session_id) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ChatsResponse { success: false, chats: Vec::new() }),
        );
    }

    (
        StatusCode::OK,
        Json(ChatsResponse { success: true, chats: app.matchmaker().snapshot() }),
    )
}

pub async fn monitor(
    State(app): State<AppState>,
    Json(req): Json<MonitorRequest>,
) -> (StatusCode, Json<AckResponse>) {
    if !app.admin_hub().is_valid(req.session_id) {
        return (StatusCode::UNAUTHORIZED, Json(AckResponse { success: false }));
    }

    // A chat that ended between listing and clicking is a silent no-op.
    if app.matchmaker().session_exists(req.chat_id) {
        app.admin_hub().watch(req.session_id, req.chat_id);
        tracing::info!(chat = %req.chat_id, "admin monitoring started");
    } else {
        tracing::debug!(chat = %req.chat_id, "monitor request for vanished chat ignored");
    }
    (StatusCode::OK, Json(AckResponse { success: true }))
}

pub async fn stop_monitor(
    State(app): State<AppState>,
    Json(req): Json<MonitorRequest>,
) -> (StatusCode, Json<AckResponse>) {
    if !app.admin_hub().is_valid(req.session_id) {
        return (StatusCode::UNAUTHORIZED, Json(AckResponse { success: false }));
    }

    app.admin_hub().unwatch(req.session_id, req.chat_id);
    (StatusCode::OK, Json(AckResponse { success: true }))
}
