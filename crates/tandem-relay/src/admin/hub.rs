//! Admin session registry and monitor fan-out.
//!
//! Login mints a token; the token owner may attach one WebSocket tap and
//! watch any number of chats. Mirroring is strictly read-only and lossy:
//! a slow tap drops frames, and participants never notice either way.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use axum::extract::ws::Message;
use serde_json::value::RawValue;
use tokio::sync::mpsc;
use uuid::Uuid;

use tandem_core::protocol::AdminFrame;

struct AdminEntry {
    issued_at: Instant,
    tap: Option<mpsc::Sender<Message>>,
    watching: HashSet<Uuid>,
}

#[derive(Default)]
pub struct AdminHub {
    entries: Mutex<HashMap<Uuid, AdminEntry>>,
}

impl AdminHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, AdminEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a session token after a successful password check.
    pub fn mint(&self) -> Uuid {
        let token = Uuid::new_v4();
        self.lock().insert(
            token,
            AdminEntry {
                issued_at: Instant::now(),
                tap: None,
                watching: HashSet::new(),
            },
        );
        token
    }

    pub fn is_valid(&self, token: Uuid) -> bool {
        self.lock().contains_key(&token)
    }

    /// Bind a WebSocket tap to the token. A reconnecting tap replaces the
    /// previous sender; the watch set survives.
    pub fn attach_tap(&self, token: Uuid, tx: mpsc::Sender<Message>) -> bool {
        match self.lock().get_mut(&token) {
            Some(entry) => {
                entry.tap = Some(tx);
                true
            }
            None => false,
        }
    }

    pub fn detach_tap(&self, token: Uuid) {
        if let Some(entry) = self.lock().get_mut(&token) {
            entry.tap = None;
            tracing::debug!(
                held_for = ?entry.issued_at.elapsed(),
                watching = entry.watching.len(),
                "admin tap detached"
            );
        }
    }

    /// Start mirroring `chat_id` to the token's tap. The caller checks that
    /// the session still exists; a vanished session never reaches here.
    pub fn watch(&self, token: Uuid, chat_id: Uuid) -> bool {
        match self.lock().get_mut(&token) {
            Some(entry) => {
                entry.watching.insert(chat_id);
                true
            }
            None => false,
        }
    }

    /// Stop mirroring. Idempotent, including for never-watched ids.
    pub fn unwatch(&self, token: Uuid, chat_id: Uuid) -> bool {
        match self.lock().get_mut(&token) {
            Some(entry) => {
                entry.watching.remove(&chat_id);
                true
            }
            None => false,
        }
    }

    /// Mirror one relayed frame to every tap watching `chat_id`.
    ///
    /// `raw` is the exact text the relay forwarded; it rides inside the
    /// monitor frame untouched. Serialized once, sent N times.
    pub fn mirror(&self, chat_id: Uuid, from: Uuid, raw: &str) {
        let entries = self.lock();
        if !entries
            .values()
            .any(|e| e.tap.is_some() && e.watching.contains(&chat_id))
        {
            return;
        }

        let signal_data = match RawValue::from_string(raw.to_owned()) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(%chat_id, error = %e, "mirror skipped: frame is not raw json");
                return;
            }
        };
        let frame = AdminFrame::Monitor { chat_id, from, signal_data };
        let text = match serde_json::to_string(&frame) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(%chat_id, error = %e, "monitor frame encode failed");
                return;
            }
        };

        for entry in entries.values() {
            if !entry.watching.contains(&chat_id) {
                continue;
            }
            if let Some(tap) = &entry.tap {
                if tap.try_send(Message::Text(text.clone())).is_err() {
                    tracing::debug!(%chat_id, "tap queue full, monitor frame dropped");
                }
            }
        }
    }

    /// Tell every watcher that `chat_id` is gone and drop their watch
    /// entries.
    pub fn chat_ended(&self, chat_id: Uuid) {
        let mut entries = self.lock();
        let text = match serde_json::to_string(&AdminFrame::ChatEnded { chat_id }) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(%chat_id, error = %e, "chat-ended frame encode failed");
                return;
            }
        };

        for entry in entries.values_mut() {
            if !entry.watching.remove(&chat_id) {
                continue;
            }
            if let Some(tap) = &entry.tap {
                let _ = tap.try_send(Message::Text(text.clone()));
            }
        }
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }
}
