use std::collections::HashMap;

use super::*;
use crate::types::VerifyMode;

#[test]
fn parses_jsonc_with_comments() {
    let doc = r#"{
        // verify policy
        "verify": { "mode": "auto", "timeout_secs": 60 },
    }"#;
    let config = parse(doc).expect("parse");
    assert_eq!(config.verify.mode, VerifyMode::Auto);
    assert_eq!(config.verify.timeout_secs, 60);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let config = parse("{}").expect("parse");
    assert_eq!(config.autonomy.max_iterations, 10);
    assert_eq!(config.compaction.tail_window, 6);
}

#[test]
fn load_from_file_defaults_when_missing() {
    let config = load_from_file(Path::new("/nonexistent/path/config.jsonc")).expect("load");
    assert_eq!(config.loop_config.max_iterations, 25);
}

#[test]
fn env_override_takes_precedence() {
    let mut config = parse(r#"{"verify": {"mode": "off"}}"#).expect("parse");
    assert_eq!(config.verify.mode, VerifyMode::Off);

    let mut env = HashMap::new();
    env.insert("CORESTACK_VERIFY__MODE".to_string(), "auto".to_string());
    apply_env_overrides(&mut config, &env).expect("override");
    assert_eq!(config.verify.mode, VerifyMode::Auto);
}

#[test]
fn invalid_env_override_value_is_rejected() {
    let mut config = CoreStackConfig::default();
    let mut env = HashMap::new();
    env.insert("CORESTACK_VERIFY__MODE".to_string(), "sideways".to_string());
    let result = apply_env_overrides(&mut config, &env);
    assert!(result.is_err());
}

#[test]
fn unrelated_env_vars_are_ignored() {
    let mut config = CoreStackConfig::default();
    let mut env = HashMap::new();
    env.insert("PATH".to_string(), "/usr/bin".to_string());
    env.insert("CORESTACK_UNKNOWN_SECTION__FIELD".to_string(), "x".to_string());
    apply_env_overrides(&mut config, &env).expect("no-op override");
    assert_eq!(config.autonomy.max_iterations, 10);
}
