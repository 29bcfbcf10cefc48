//! Admin tap frame and HTTP payload vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::value::RawValue;
use serde_json::{json, Value};
use tandem_core::protocol::{AdminFrame, ChatSummary, ChatsResponse, LoginResponse};
use uuid::Uuid;

#[test]
fn monitor_frame_mirrors_raw_signal_verbatim() {
    let chat_id = Uuid::new_v4();
    let from = Uuid::new_v4();
    // Deliberately unusual spacing/field order: the mirror must not re-encode.
    let raw = r#"{"sdp": {"type":"offer"},  "type":"offer"}"#;
    let frame = AdminFrame::Monitor {
        chat_id,
        from,
        signal_data: RawValue::from_string(raw.to_string()).unwrap(),
    };

    let text = serde_json::to_string(&frame).unwrap();
    assert!(text.contains(raw), "signalData was re-encoded: {text}");

    let out: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(out["type"], "ADMIN_MONITOR");
    assert_eq!(out["chatId"], json!(chat_id.to_string()));
    assert_eq!(out["from"], json!(from.to_string()));
    assert_eq!(out["signalData"]["type"], "offer");
}

#[test]
fn chat_ended_frame_shape() {
    let chat_id = Uuid::new_v4();
    let out = serde_json::to_value(AdminFrame::ChatEnded { chat_id }).unwrap();
    assert_eq!(out, json!({"type": "ADMIN_CHAT_ENDED", "chatId": chat_id.to_string()}));
}

#[test]
fn login_response_omits_absent_fields() {
    let ok = LoginResponse { success: true, session_id: Some(Uuid::new_v4()), message: None };
    let out = serde_json::to_value(&ok).unwrap();
    assert_eq!(out["success"], true);
    assert!(out.get("sessionId").is_some());
    assert!(out.get("message").is_none());

    let denied =
        LoginResponse { success: false, session_id: None, message: Some("invalid password".into()) };
    let out = serde_json::to_value(&denied).unwrap();
    assert_eq!(out, json!({"success": false, "message": "invalid password"}));
}

#[test]
fn chats_response_rows() {
    let row = ChatSummary { id: Uuid::new_v4(), client1: Uuid::new_v4(), client2: Uuid::new_v4() };
    let out = serde_json::to_value(ChatsResponse { success: true, chats: vec![row.clone()] }).unwrap();
    assert_eq!(out["success"], true);
    assert_eq!(out["chats"][0]["id"], json!(row.id.to_string()));
    assert_eq!(out["chats"][0]["client1"], json!(row.client1.to_string()));
    assert_eq!(out["chats"][0]["client2"], json!(row.client2.to_string()));
}
