//! Operational HTTP endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::app_state::AppState;

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    tracing::trace!(
        connections = state.connections().len(),
        waiting = state.matchmaker().waiting_count(),
        sessions = state.matchmaker().session_count(),
        "healthz"
    );
    (StatusCode::OK, "ok")
}
