//! Client-side connection manager for the tandem chat service.
//!
//! The embedder supplies a [`Dialer`] that opens a text-frame transport to
//! the relay. [`ChatClient::start`] spawns a background actor that owns the
//! transport, keeps the connection alive with heartbeats, reconnects with
//! bounded exponential backoff when the link drops, and surfaces everything
//! the UI needs as [`ChatEvent`]s on a bounded channel.
//!
//! ```no_run
//! # use tandem_client::{ChatClient, ReconnectPolicy, ChatEvent};
//! # use tandem_core::protocol::ChatMode;
//! # async fn demo(dialer: impl tandem_client::Dialer) -> tandem_core::Result<()> {
//! let (client, mut events) = ChatClient::start(dialer, ChatMode::Text, ReconnectPolicy::default());
//! client.find_partner().await?;
//! while let Some(event) = events.recv().await {
//!     if let ChatEvent::PartnerFound { partner_id } = event {
//!         client.send_message("hello").await?;
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod event;
pub mod manager;
pub mod policy;
pub mod transport;

pub use event::{ChatEvent, ChatRecord, ConnectionState, Direction, DisconnectReason, SignalKind};
pub use manager::ChatClient;
pub use policy::ReconnectPolicy;
pub use transport::{Dialer, Transport};
