#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tandem_core::TandemError;
use tandem_relay::config;

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
admin:
  password: "hunter2"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.admin.password, "hunter2");
    // defaults fill the relay section
    assert_eq!(cfg.relay.listen, "0.0.0.0:8080");
    assert_eq!(cfg.relay.ping_interval_ms, 20000);
    assert_eq!(cfg.relay.idle_timeout_ms, 60000);
    assert_eq!(cfg.relay.max_frame_bytes, 65536);
}

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
relay:
  listen: "0.0.0.0:8080"
  ping_interval_msec: 20000 # typo should fail
admin:
  password: "hunter2"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(matches!(err, TandemError::BadRequest(_)), "got {err:?}");
}

#[test]
fn deny_unknown_top_level_field() {
    let bad = r#"
version: 1
admin:
  password: "hunter2"
metrics:
  enabled: true
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn version_must_be_one() {
    let bad = r#"
version: 2
admin:
  password: "hunter2"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("version"), "got {err}");
}

#[test]
fn admin_section_is_required() {
    let bad = "version: 1\n";
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn empty_admin_password_rejected() {
    let bad = r#"
version: 1
admin:
  password: ""
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn timer_ranges_enforced() {
    let too_fast = r#"
version: 1
relay:
  ping_interval_ms: 100
admin:
  password: "hunter2"
"#;
    assert!(config::load_from_str(too_fast).is_err());

    let idle_below_ping = r#"
version: 1
relay:
  ping_interval_ms: 30000
  idle_timeout_ms: 20000
admin:
  password: "hunter2"
"#;
    assert!(config::load_from_str(idle_below_ping).is_err());
}

#[test]
fn frame_cap_range_enforced() {
    let too_small = r#"
version: 1
relay:
  max_frame_bytes: 16
admin:
  password: "hunter2"
"#;
    assert!(config::load_from_str(too_small).is_err());

    let too_large = r#"
version: 1
relay:
  max_frame_bytes: 10485760
admin:
  password: "hunter2"
"#;
    assert!(config::load_from_str(too_large).is_err());
}
