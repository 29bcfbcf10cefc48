//! Client-facing message envelope (JSON, internally tagged).
//!
//! Every frame on the chat channel is exactly one of these, discriminated by
//! the `type` field. The union is closed: unknown tags fail deserialization
//! and the sender gets an `error` envelope back, with no state touched.
//!
//! Signaling payloads (`sdp`, `candidate`) stay opaque `Value`s. The relay
//! decodes a frame once to learn its tag and forwards the original text, so
//! nothing here normalizes or re-encodes what the peers exchange.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, TandemError};

/// Upper bound on `text_message` content, counted in chars.
pub const MAX_TEXT_CHARS: usize = 1000;

/// Partner-search flavor. Keys the wait queue: text seekers never pair with
/// video seekers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Text,
    Video,
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatMode::Text => f.write_str("text"),
            ChatMode::Video => f.write_str("video"),
        }
    }
}

/// The closed wire union.
///
/// Note: serde's internally tagged representation cannot combine with
/// `deny_unknown_fields`, so extra payload keys are tolerated; unknown *tags*
/// and missing/mistyped fields still hard-fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Presence hello sent once after connecting. Carries no payload and
    /// triggers nothing; queue entry happens only via `find_partner`.
    Join,
    /// Leave the current session (or the wait queue) explicitly.
    Leave,
    /// Enter the wait queue for a partner of the given mode.
    FindPartner { mode: ChatMode },
    /// Server → client: a partner was found; the id is the peer's ephemeral
    /// connection id.
    #[serde(rename_all = "camelCase")]
    PartnerFound { partner_id: Uuid },
    /// Server → client: the peer left or dropped; the session is over.
    PartnerDisconnected,
    /// Chat line. `timestamp` is compose-time epoch milliseconds, relayed
    /// untouched.
    TextMessage { content: String, timestamp: i64 },
    /// WebRTC offer, opaque to the relay.
    Offer { sdp: Value },
    /// WebRTC answer, opaque to the relay.
    Answer { sdp: Value },
    /// ICE candidate, opaque to the relay.
    IceCandidate { candidate: Value },
    /// Server → client error report. Scoped to the recipient only.
    Error { message: String },
    Ping,
    Pong,
}

impl Envelope {
    /// Discriminant string as it appears on the wire. For logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Envelope::Join => "join",
            Envelope::Leave => "leave",
            Envelope::FindPartner { .. } => "find_partner",
            Envelope::PartnerFound { .. } => "partner_found",
            Envelope::PartnerDisconnected => "partner_disconnected",
            Envelope::TextMessage { .. } => "text_message",
            Envelope::Offer { .. } => "offer",
            Envelope::Answer { .. } => "answer",
            Envelope::IceCandidate { .. } => "ice_candidate",
            Envelope::Error { .. } => "error",
            Envelope::Ping => "ping",
            Envelope::Pong => "pong",
        }
    }

    /// Whether this envelope is session traffic the relay forwards verbatim
    /// to the sender's partner.
    pub fn is_relayable(&self) -> bool {
        matches!(
            self,
            Envelope::TextMessage { .. }
                | Envelope::Offer { .. }
                | Envelope::Answer { .. }
                | Envelope::IceCandidate { .. }
        )
    }

    /// Tags only the server may emit. A client sending one of these gets an
    /// `error` envelope back instead of a relay.
    pub fn is_server_only(&self) -> bool {
        matches!(
            self,
            Envelope::PartnerFound { .. }
                | Envelope::PartnerDisconnected
                | Envelope::Error { .. }
                | Envelope::Pong
        )
    }

    /// Schema checks that serde cannot express. Runs once at decode time.
    pub fn validate(&self) -> Result<()> {
        if let Envelope::TextMessage { content, .. } = self {
            let chars = content.chars().count();
            if chars == 0 {
                return Err(TandemError::BadRequest(
                    "text_message content must not be empty".into(),
                ));
            }
            if chars > MAX_TEXT_CHARS {
                return Err(TandemError::BadRequest(format!(
                    "text_message content exceeds {MAX_TEXT_CHARS} chars"
                )));
            }
        }
        Ok(())
    }

    /// Decode one wire frame and apply [`Envelope::validate`].
    pub fn from_frame(text: &str) -> Result<Envelope> {
        let env: Envelope = serde_json::from_str(text)
            .map_err(|e| TandemError::BadRequest(format!("invalid envelope: {e}")))?;
        env.validate()?;
        Ok(env)
    }

    /// Build an `error` envelope from a client-visible failure.
    pub fn error(message: impl Into<String>) -> Envelope {
        Envelope::Error {
            message: message.into(),
        }
    }
}
