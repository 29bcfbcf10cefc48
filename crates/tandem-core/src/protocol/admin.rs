//! Admin monitor frames and HTTP payload shapes.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use uuid::Uuid;

/// Frames pushed to an admin tap connection.
///
/// Serialize-only: the tap is a read-only mirror, so nothing ever parses
/// these back, and `signal_data` embeds the relayed frame as raw JSON to keep
/// it byte-identical to what the session partner received.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum AdminFrame {
    /// One mirrored signaling frame from a watched session.
    #[serde(rename = "ADMIN_MONITOR", rename_all = "camelCase")]
    Monitor {
        chat_id: Uuid,
        from: Uuid,
        signal_data: Box<RawValue>,
    },
    /// A watched session ended; the watch entry is gone.
    #[serde(rename = "ADMIN_CHAT_ENDED", rename_all = "camelCase")]
    ChatEnded { chat_id: Uuid },
}

/// `POST /api/admin/login` body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// `POST /api/admin/login` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /api/admin/videochats` query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatsQuery {
    pub session_id: Uuid,
}

/// One row of the active-session snapshot. Ids only, never content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatSummary {
    pub id: Uuid,
    pub client1: Uuid,
    pub client2: Uuid,
}

/// `GET /api/admin/videochats` response.
#[derive(Debug, Serialize)]
pub struct ChatsResponse {
    pub success: bool,
    pub chats: Vec<ChatSummary>,
}

/// `POST /api/admin/monitor` and `stop-monitor` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorRequest {
    pub session_id: Uuid,
    pub chat_id: Uuid,
}

/// Uniform `{success}` ack.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
}
