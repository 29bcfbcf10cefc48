//! tandem core: transport-agnostic wire contracts and error types.
//!
//! This crate defines the message envelope exchanged between chat clients and
//! the relay, the admin monitor frames, the admin HTTP payload shapes, and the
//! error surface shared by the relay and the client SDK. It intentionally
//! carries no transport or runtime dependencies so both halves can reuse it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `TandemError`/`Result` so a malformed
//! frame can never take a process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, TandemError};
