//! tandem relay binary.
//!
//! Pairs anonymous clients into two-party chat sessions and relays their
//! signaling traffic. WebSocket endpoint on `/ws`, admin API under
//! `/api/admin`, liveness on `/healthz`.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use tandem_relay::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "tandem.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .relay
        .listen
        .parse()
        .expect("relay.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg);
    let app = router::build_router(state);

    tracing::info!(%listen, "tandem-relay starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
