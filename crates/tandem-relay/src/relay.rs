//! Signaling relay: decode once, forward the original text.
//!
//! The transport layer has already decoded and validated the frame to learn
//! its tag; the relay never re-encodes. The partner receives the exact bytes
//! the sender wrote, so SDP blobs and candidate payloads survive untouched,
//! and the admin hub mirrors the same text.

use std::sync::Arc;

use axum::extract::ws::Message;
use uuid::Uuid;

use tandem_core::error::{Result, TandemError};
use tandem_core::protocol::Envelope;

use crate::admin::hub::AdminHub;
use crate::connections::ConnectionRegistry;
use crate::pairing::matchmaker::Matchmaker;

pub struct Relay {
    connections: Arc<ConnectionRegistry>,
    matchmaker: Arc<Matchmaker>,
    admin: Arc<AdminHub>,
}

impl Relay {
    pub fn new(
        connections: Arc<ConnectionRegistry>,
        matchmaker: Arc<Matchmaker>,
        admin: Arc<AdminHub>,
    ) -> Self {
        Self { connections, matchmaker, admin }
    }

    /// Forward one session frame from `from` to its partner.
    ///
    /// Fire-and-forget: a full partner queue drops the frame without
    /// blocking, and delivery to the tap can never stall participants.
    /// Fails with `NotPaired` when the sender has no session; the caller
    /// reports that to the sender alone.
    pub fn forward(&self, from: Uuid, raw: &str, env: &Envelope) -> Result<()> {
        let session = self.matchmaker.session_of(from).ok_or(TandemError::NotPaired)?;
        let partner = session
            .partner_of(from)
            .ok_or_else(|| TandemError::Internal("session lost its sender".into()))?;

        let delivered = self.connections.send_raw(partner, Message::Text(raw.to_owned()));
        if !delivered {
            tracing::debug!(
                %from,
                %partner,
                tag = env.tag(),
                "partner queue unavailable, frame dropped"
            );
        }

        self.admin.mirror(session.id, from, raw);
        Ok(())
    }
}
