//! WebSocket handler.
//!
//! One route serves two kinds of connection, split on the query string:
//! plain clients (no params) and admin taps (`?admin=<token>`). Each client
//! task owns its socket plus an outbound mpsc queue registered in the
//! connection registry, so matchmaking and relay can reach it from any task.
//! Lifecycle is transport ping + idle timeout; envelope handling is one
//! exhaustive match, decode-once then forward-raw.

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use uuid::Uuid;

use tandem_core::protocol::Envelope;
use tandem_core::TandemError;

use crate::app_state::AppState;
use crate::connections::Connection;
use crate::pairing::{EndedSession, Enqueued, PairedSession};

/// Outbound queue depth per connection. Relay traffic is a trickle; the cap
/// only matters when a reader stalls, at which point frames drop.
const OUTBOUND_QUEUE: usize = 256;

/// How often the idle clock is consulted.
const IDLE_SWEEP: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Admin session token; presence turns the connection into a tap.
    #[serde(default)]
    pub admin: Option<Uuid>,
}

fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.as_bytes().len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    ws: WebSocketUpgrade,
    Query(q): Query<WsQuery>,
) -> Response {
    if let Some(token) = q.admin {
        if !app.admin_hub().is_valid(token) {
            return (StatusCode::UNAUTHORIZED, "invalid admin token").into_response();
        }
        return ws.on_upgrade(move |socket| run_admin_tap(app, token, socket));
    }
    ws.on_upgrade(move |socket| run_client(app, socket))
}

/// Core client session loop.
async fn run_client(app: AppState, socket: WebSocket) {
    let client = Uuid::new_v4();

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    app.connections().insert(client, Connection { tx: out_tx.clone() });

    let (mut ws_tx, mut ws_rx) = socket.split();

    let relay_cfg = &app.cfg().relay;
    let max_frame = relay_cfg.max_frame_bytes;
    let idle_timeout = Duration::from_millis(relay_cfg.idle_timeout_ms);
    let mut ping_tick = tokio::time::interval(Duration::from_millis(relay_cfg.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    tracing::info!(%client, "client connected");

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                last_activity = Instant::now();

                // cheap-first: size gate before any JSON work
                if frame_len(&msg) > max_frame {
                    tracing::warn!(%client, len = frame_len(&msg), "oversized frame rejected");
                    send_to_self(&out_tx, &Envelope::error(TandemError::PayloadTooLarge.to_string())).await;
                    continue;
                }

                match msg {
                    Message::Text(text) => handle_text(&app, client, &out_tx, text).await,
                    Message::Binary(_) => {
                        send_to_self(&out_tx, &Envelope::error("binary frames are not supported")).await;
                    }
                    Message::Ping(payload) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => break,
                }
            }

            // transport keepalive
            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = tokio::time::sleep(IDLE_SWEEP) => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::info!(%client, "idle timeout");
                    send_to_self(&out_tx, &Envelope::error("idle timeout")).await;
                    break;
                }
            }
        }
    }

    // Session teardown first so the survivor notice can still be delivered,
    // then drop our own registration.
    if let Some(ended) = app.matchmaker().disconnect(client) {
        end_session(&app, &ended);
    }
    app.connections().remove(client);
    tracing::info!(%client, "client disconnected");
}

/// Decode one text frame and route it. Every protocol failure is answered to
/// the sender alone; nothing here can touch another client's state.
async fn handle_text(app: &AppState, client: Uuid, out_tx: &mpsc::Sender<Message>, text: String) {
    let env = match Envelope::from_frame(&text) {
        Ok(env) => env,
        Err(e) => {
            tracing::debug!(%client, error = %e, "frame rejected");
            send_to_self(out_tx, &Envelope::error(e.to_string())).await;
            return;
        }
    };

    match env {
        Envelope::Join => {
            tracing::debug!(%client, "client hello");
        }
        Envelope::Ping => {
            send_to_self(out_tx, &Envelope::Pong).await;
        }
        Envelope::FindPartner { mode } => {
            let outcome = app.matchmaker().find_partner(client, mode);
            if let Some(ended) = outcome.ended {
                end_session(app, &ended);
            }
            match outcome.result {
                Enqueued::Waiting => {
                    tracing::debug!(%client, %mode, "waiting for partner");
                }
                Enqueued::Paired(paired) => announce_pair(app, &paired),
            }
        }
        Envelope::Leave => {
            if let Some(ended) = app.matchmaker().leave(client) {
                end_session(app, &ended);
            }
        }
        env @ (Envelope::TextMessage { .. }
        | Envelope::Offer { .. }
        | Envelope::Answer { .. }
        | Envelope::IceCandidate { .. }) => {
            if let Err(e) = app.relay().forward(client, &text, &env) {
                tracing::debug!(%client, tag = env.tag(), error = %e, "relay refused");
                if e.is_client_visible() {
                    send_to_self(out_tx, &Envelope::error(e.to_string())).await;
                }
            }
        }
        env @ (Envelope::PartnerFound { .. }
        | Envelope::PartnerDisconnected
        | Envelope::Error { .. }
        | Envelope::Pong) => {
            send_to_self(
                out_tx,
                &Envelope::error(format!("clients may not send {}", env.tag())),
            )
            .await;
        }
    }
}

/// Push `partner_found` to both members of a fresh pairing.
fn announce_pair(app: &AppState, paired: &PairedSession) {
    app.connections()
        .send_envelope(paired.first, &Envelope::PartnerFound { partner_id: paired.second });
    app.connections()
        .send_envelope(paired.second, &Envelope::PartnerFound { partner_id: paired.first });
    tracing::info!(
        session = %paired.session_id,
        mode = %paired.mode,
        first = %paired.first,
        second = %paired.second,
        "clients paired"
    );
}

/// Deliver the survivor notice and retire the chat from every admin tap.
fn end_session(app: &AppState, ended: &EndedSession) {
    app.connections().send_envelope(ended.survivor, &Envelope::PartnerDisconnected);
    app.admin_hub().chat_ended(ended.session_id);
    tracing::info!(
        session = %ended.session_id,
        survivor = %ended.survivor,
        reason = ?ended.reason,
        lasted = ?ended.lasted,
        "session ended"
    );
}

async fn send_to_self(out_tx: &mpsc::Sender<Message>, env: &Envelope) {
    match serde_json::to_string(env) {
        Ok(text) => {
            let _ = out_tx.send(Message::Text(text)).await;
        }
        Err(e) => tracing::error!(tag = env.tag(), error = %e, "envelope encode failed"),
    }
}

/// Read-only admin mirror loop. Inbound traffic is ignored apart from
/// lifecycle frames and envelope `ping`.
async fn run_admin_tap(app: AppState, token: Uuid, socket: WebSocket) {
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    if !app.admin_hub().attach_tap(token, out_tx.clone()) {
        return;
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    let relay_cfg = &app.cfg().relay;
    let idle_timeout = Duration::from_millis(relay_cfg.idle_timeout_ms);
    let mut ping_tick = tokio::time::interval(Duration::from_millis(relay_cfg.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    tracing::info!("admin tap attached");

    loop {
        tokio::select! {
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                last_activity = Instant::now();

                match msg {
                    Message::Text(text) => {
                        if matches!(Envelope::from_frame(&text), Ok(Envelope::Ping)) {
                            send_to_self(&out_tx, &Envelope::Pong).await;
                        } else {
                            tracing::debug!("tap is read-only, frame ignored");
                        }
                    }
                    Message::Ping(payload) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            _ = tokio::time::sleep(IDLE_SWEEP) => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::info!("admin tap idle timeout");
                    break;
                }
            }
        }
    }

    app.admin_hub().detach_tap(token);
}
