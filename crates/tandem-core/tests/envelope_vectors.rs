//! Envelope wire-shape vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::{json, Value};
use tandem_core::protocol::{ChatMode, Envelope, MAX_TEXT_CHARS};
use tandem_core::TandemError;
use uuid::Uuid;

#[test]
fn parse_find_partner_text() {
    let env = Envelope::from_frame(r#"{"type":"find_partner","mode":"text"}"#).unwrap();
    assert_eq!(env, Envelope::FindPartner { mode: ChatMode::Text });
}

#[test]
fn parse_find_partner_video() {
    let env = Envelope::from_frame(r#"{"type":"find_partner","mode":"video"}"#).unwrap();
    assert_eq!(env, Envelope::FindPartner { mode: ChatMode::Video });
}

#[test]
fn parse_unit_tags() {
    for (frame, want) in [
        (r#"{"type":"join"}"#, Envelope::Join),
        (r#"{"type":"leave"}"#, Envelope::Leave),
        (r#"{"type":"partner_disconnected"}"#, Envelope::PartnerDisconnected),
        (r#"{"type":"ping"}"#, Envelope::Ping),
        (r#"{"type":"pong"}"#, Envelope::Pong),
    ] {
        assert_eq!(Envelope::from_frame(frame).unwrap(), want, "frame {frame}");
    }
}

#[test]
fn parse_text_message() {
    let env =
        Envelope::from_frame(r#"{"type":"text_message","content":"hi","timestamp":1712345678901}"#)
            .unwrap();
    assert_eq!(
        env,
        Envelope::TextMessage { content: "hi".into(), timestamp: 1_712_345_678_901 }
    );
}

#[test]
fn signaling_payloads_stay_opaque() {
    let frame = r#"{"type":"offer","sdp":{"type":"offer","sdp":"v=0\r\n..."}}"#;
    let env = Envelope::from_frame(frame).unwrap();
    match &env {
        Envelope::Offer { sdp } => assert_eq!(sdp["type"], "offer"),
        other => panic!("unexpected variant: {other:?}"),
    }

    let frame = r#"{"type":"ice_candidate","candidate":{"candidate":"candidate:0 1 UDP ...","sdpMid":"0"}}"#;
    let env = Envelope::from_frame(frame).unwrap();
    assert!(env.is_relayable());
}

#[test]
fn partner_found_uses_camel_case_id() {
    let id = Uuid::new_v4();
    let out = serde_json::to_value(Envelope::PartnerFound { partner_id: id }).unwrap();
    assert_eq!(out["type"], "partner_found");
    assert_eq!(out["partnerId"], json!(id.to_string()));
    assert!(out.get("partner_id").is_none());

    let back: Envelope = serde_json::from_value(out).unwrap();
    assert_eq!(back, Envelope::PartnerFound { partner_id: id });
}

#[test]
fn unknown_tag_rejected() {
    let err = Envelope::from_frame(r#"{"type":"typing"}"#).unwrap_err();
    assert!(matches!(err, TandemError::BadRequest(_)));
}

#[test]
fn missing_field_rejected() {
    // text_message without a timestamp
    let err = Envelope::from_frame(r#"{"type":"text_message","content":"hi"}"#).unwrap_err();
    assert!(matches!(err, TandemError::BadRequest(_)));
}

#[test]
fn mistyped_field_rejected() {
    let err =
        Envelope::from_frame(r#"{"type":"text_message","content":"hi","timestamp":"now"}"#)
            .unwrap_err();
    assert!(matches!(err, TandemError::BadRequest(_)));
}

#[test]
fn non_object_frame_rejected() {
    assert!(Envelope::from_frame("[]").is_err());
    assert!(Envelope::from_frame("\"join\"").is_err());
    assert!(Envelope::from_frame("not json").is_err());
}

#[test]
fn content_bounds_enforced_in_chars() {
    let ok = Envelope::TextMessage { content: "é".repeat(MAX_TEXT_CHARS), timestamp: 0 };
    ok.validate().unwrap();

    let long = Envelope::TextMessage { content: "é".repeat(MAX_TEXT_CHARS + 1), timestamp: 0 };
    assert!(matches!(long.validate(), Err(TandemError::BadRequest(_))));

    let empty = Envelope::TextMessage { content: String::new(), timestamp: 0 };
    assert!(matches!(empty.validate(), Err(TandemError::BadRequest(_))));
}

#[test]
fn from_frame_applies_validation() {
    let frame = format!(
        r#"{{"type":"text_message","content":"{}","timestamp":1}}"#,
        "x".repeat(MAX_TEXT_CHARS + 1)
    );
    assert!(Envelope::from_frame(&frame).is_err());
}

#[test]
fn relayable_and_server_only_partitions() {
    let relayable = [
        Envelope::TextMessage { content: "x".into(), timestamp: 1 },
        Envelope::Offer { sdp: json!({}) },
        Envelope::Answer { sdp: json!({}) },
        Envelope::IceCandidate { candidate: json!({}) },
    ];
    for env in &relayable {
        assert!(env.is_relayable(), "{} should relay", env.tag());
        assert!(!env.is_server_only());
    }

    let server_only = [
        Envelope::PartnerFound { partner_id: Uuid::new_v4() },
        Envelope::PartnerDisconnected,
        Envelope::error("nope"),
        Envelope::Pong,
    ];
    for env in &server_only {
        assert!(env.is_server_only(), "{} is server-only", env.tag());
        assert!(!env.is_relayable());
    }

    for env in [Envelope::Join, Envelope::Leave, Envelope::Ping] {
        assert!(!env.is_relayable());
        assert!(!env.is_server_only());
    }
}

#[test]
fn tag_strings_match_wire() {
    assert_eq!(Envelope::FindPartner { mode: ChatMode::Text }.tag(), "find_partner");
    assert_eq!(Envelope::IceCandidate { candidate: Value::Null }.tag(), "ice_candidate");
    assert_eq!(Envelope::PartnerDisconnected.tag(), "partner_disconnected");
}

#[test]
fn mode_wire_form_is_lowercase() {
    assert_eq!(serde_json::to_string(&ChatMode::Text).unwrap(), "\"text\"");
    assert_eq!(serde_json::to_string(&ChatMode::Video).unwrap(), "\"video\"");
    assert_eq!(ChatMode::Video.to_string(), "video");
}

#[test]
fn error_builder_shape() {
    let out = serde_json::to_value(Envelope::error("not paired")).unwrap();
    assert_eq!(out, json!({"type": "error", "message": "not paired"}));
}
