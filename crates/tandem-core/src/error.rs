//! Shared error type across tandem crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, TandemError>;

/// Unified error type used by the relay and the client SDK.
#[derive(Debug, Error)]
pub enum TandemError {
    /// Invalid input / malformed or unschematic message.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Admin password or session token rejected.
    #[error("auth failed")]
    AuthFailed,
    /// Frame exceeds the configured size cap.
    #[error("payload too large")]
    PayloadTooLarge,
    /// Sender has no active session to relay into.
    #[error("not paired")]
    NotPaired,
    /// Client-side operation that requires an open, established connection.
    #[error("not connected")]
    NotConnected,
    /// Reconnection attempts exhausted; the connection is terminally down.
    #[error("reconnect attempts exhausted")]
    ReconnectExhausted,
    /// Transport-level failure (dial, read, or write).
    #[error("transport: {0}")]
    Transport(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TandemError {
    /// Whether the error is worth reporting back to the offending peer.
    ///
    /// Transport and internal failures are log-only; the rest map to an
    /// `error` envelope addressed to the sender and nobody else.
    pub fn is_client_visible(&self) -> bool {
        !matches!(
            self,
            TandemError::Transport(_) | TandemError::Internal(_)
        )
    }
}
