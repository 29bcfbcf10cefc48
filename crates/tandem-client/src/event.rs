//! Events and observable state surfaced to the embedder.

use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

/// Lifecycle of the managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport and no redial pending. Terminal until a manual reconnect.
    Disconnected,
    /// A dial is in flight.
    Connecting,
    /// Transport open; chat and signaling traffic flows.
    Connected,
    /// Transport lost; a timed redial is pending.
    Reconnecting,
}

/// Why the manager ended up [`ConnectionState::Disconnected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The embedder asked for the close.
    Clean,
    /// Automatic redials ran out.
    Exhausted,
}

/// Which signaling frame a [`ChatEvent::Signal`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// One chat line kept in the per-pairing history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRecord {
    pub direction: Direction,
    pub content: String,
    /// Sender-side wall clock, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Everything the background actor reports to the embedder.
///
/// Delivered on a bounded channel; a slow consumer loses intermediate
/// events rather than stalling the connection, except terminal
/// [`ChatEvent::Disconnected`] which is always delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Transport open and ready. Also fires after a successful redial.
    Connected,
    /// Transport lost; redial number `attempt` runs after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// No transport and no redial pending.
    Disconnected { reason: DisconnectReason },
    /// The relay paired us.
    PartnerFound { partner_id: Uuid },
    /// The partner left or dropped; the pairing is gone.
    PartnerDisconnected,
    /// A chat line from the partner.
    MessageReceived { content: String, timestamp: i64 },
    /// A WebRTC signaling payload from the partner, verbatim.
    Signal { kind: SignalKind, payload: Value },
    /// The relay rejected something we sent.
    ErrorNotice { message: String },
}
