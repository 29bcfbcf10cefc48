//! Connection registry: client id -> outbound queue.
//!
//! Each WebSocket task registers its outbound sender here so matchmaking,
//! relay, and teardown paths can push frames to any connected client. Sends
//! are lossy by contract: a full or closed queue drops the frame rather than
//! blocking the caller, so one stalled reader never backs up another session.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use tandem_core::protocol::Envelope;

/// One client's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    conns: DashMap<Uuid, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self { conns: DashMap::new() }
    }

    pub fn insert(&self, client: Uuid, conn: Connection) {
        self.conns.insert(client, conn);
    }

    pub fn remove(&self, client: Uuid) -> Option<Connection> {
        self.conns.remove(&client).map(|(_, conn)| conn)
    }

    pub fn get(&self, client: Uuid) -> Option<Connection> {
        self.conns.get(&client).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Queue a raw frame for `client`. Returns false if the client is gone or
    /// its queue is full.
    pub fn send_raw(&self, client: Uuid, msg: Message) -> bool {
        match self.get(client) {
            Some(conn) => conn.tx.try_send(msg).is_ok(),
            None => false,
        }
    }

    /// Serialize an envelope and queue it for `client`.
    pub fn send_envelope(&self, client: Uuid, env: &Envelope) -> bool {
        match serde_json::to_string(env) {
            Ok(text) => self.send_raw(client, Message::Text(text)),
            Err(e) => {
                tracing::error!(%client, tag = env.tag(), error = %e, "envelope encode failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn conn(capacity: usize) -> (Connection, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Connection { tx }, rx)
    }

    #[tokio::test]
    async fn send_raw_reaches_registered_client() {
        let reg = ConnectionRegistry::new();
        let id = Uuid::new_v4();
        let (c, mut rx) = conn(4);
        reg.insert(id, c);

        assert!(reg.send_raw(id, Message::Text("hello".into())));
        match rx.recv().await.unwrap() {
            Message::Text(t) => assert_eq!(t, "hello"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_to_unknown_client_reports_drop() {
        let reg = ConnectionRegistry::new();
        assert!(!reg.send_raw(Uuid::new_v4(), Message::Text("x".into())));
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let reg = ConnectionRegistry::new();
        let id = Uuid::new_v4();
        let (c, _rx) = conn(1);
        reg.insert(id, c);

        assert!(reg.send_raw(id, Message::Text("a".into())));
        assert!(!reg.send_raw(id, Message::Text("b".into())));
    }

    #[tokio::test]
    async fn send_envelope_encodes_wire_tag() {
        let reg = ConnectionRegistry::new();
        let id = Uuid::new_v4();
        let (c, mut rx) = conn(4);
        reg.insert(id, c);

        assert!(reg.send_envelope(id, &Envelope::PartnerDisconnected));
        match rx.recv().await.unwrap() {
            Message::Text(t) => assert_eq!(t, r#"{"type":"partner_disconnected"}"#),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn remove_unregisters() {
        let reg = ConnectionRegistry::new();
        let id = Uuid::new_v4();
        let (c, _rx) = conn(4);
        reg.insert(id, c);
        assert_eq!(reg.len(), 1);

        assert!(reg.remove(id).is_some());
        assert!(reg.is_empty());
        assert!(!reg.send_raw(id, Message::Text("late".into())));
    }
}
