//! Wire protocol modules.
//!
//! - [`envelope`]: the closed JSON union exchanged between chat clients and
//!   the relay. One envelope per WebSocket text frame; binary frames are
//!   rejected at the transport.
//! - [`admin`]: monitor-tap frames and admin HTTP payload shapes. Tap frames
//!   are serialize-only because the relay mirrors forwarded traffic verbatim
//!   (`RawValue`) and never reads them back.
//!
//! All parsing is panic-free: malformed input surfaces as a serde error and
//! is reported to the offending connection only.

pub mod admin;
pub mod envelope;

pub use admin::{
    AckResponse, AdminFrame, ChatSummary, ChatsQuery, ChatsResponse, LoginRequest, LoginResponse,
    MonitorRequest,
};
pub use envelope::{ChatMode, Envelope, MAX_TEXT_CHARS};
