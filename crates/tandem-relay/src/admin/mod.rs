//! Admin surface: session tokens, monitor fan-out, and the HTTP API.

pub mod http;
pub mod hub;

pub use hub::AdminHub;
