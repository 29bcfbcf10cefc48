//! tandem relay library entry.
//!
//! Wires the WebSocket transport, matchmaking core, signaling relay, and
//! admin surface into one server stack. Consumed by the binary (`main.rs`)
//! and by integration tests.

pub mod admin;
pub mod app_state;
pub mod config;
pub mod connections;
pub mod ops;
pub mod pairing;
pub mod relay;
pub mod router;
pub mod transport;
