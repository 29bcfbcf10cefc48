//! Transport seam between the connection manager and the wire.
//!
//! The manager never touches sockets directly. The embedder provides a
//! [`Dialer`]; each successful dial yields one [`Transport`] that lives
//! until the connection drops or the manager closes it.

use async_trait::async_trait;

use tandem_core::Result;

/// One open, ordered, text-frame connection to the relay.
#[async_trait]
pub trait Transport: Send {
    /// Writes one text frame. An error means the connection is unusable.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Waits for the next inbound text frame. `None` means the remote end
    /// closed; `Some(Err(_))` means the connection failed mid-read.
    async fn recv(&mut self) -> Option<Result<String>>;

    /// Closes the connection. Safe to call on an already-dead transport.
    async fn close(&mut self) -> Result<()>;
}

/// Opens fresh [`Transport`]s, once per (re)connection attempt.
#[async_trait]
pub trait Dialer: Send + 'static {
    async fn dial(&mut self) -> Result<Box<dyn Transport>>;
}
