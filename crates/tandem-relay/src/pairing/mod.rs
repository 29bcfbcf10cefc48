//! Matchmaking queue and session registry.

pub mod matchmaker;
pub mod queue;
pub mod sessions;

pub use matchmaker::{EndReason, EndedSession, Enqueued, EnqueueOutcome, Matchmaker, PairedSession};
pub use sessions::Session;
