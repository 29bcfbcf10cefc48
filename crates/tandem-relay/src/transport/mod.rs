//! Transport layer (WebSocket upgrade and per-connection loops).

pub mod ws;
