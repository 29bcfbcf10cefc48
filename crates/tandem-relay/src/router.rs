//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{admin, app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/healthz", get(ops::healthz))
        .route("/api/admin/login", post(admin::http::login))
        .route("/api/admin/videochats", get(admin::http::videochats))
        .route("/api/admin/monitor", post(admin::http::monitor))
        .route("/api/admin/stop-monitor", post(admin::http::stop_monitor))
        .with_state(state)
}
