use super::*;

#[test]
fn s1_resolve_known_alias() {
    let resolved = resolve_model("haiku");
    assert_eq!(resolved.canonical, "claude-haiku-4-5-20251001");
    assert!(!resolved.fell_back);
}

#[test]
fn s1_resolve_canonical_id_passes_through() {
    let resolved = resolve_model("claude-sonnet-4-20250514");
    assert_eq!(resolved.canonical, "claude-sonnet-4-20250514");
    assert!(!resolved.fell_back);
}

#[test]
fn s1_unknown_alias_falls_back_to_default() {
    let resolved = resolve_model("unknown-model");
    assert_eq!(resolved.canonical, default_model());
    assert!(resolved.fell_back);
}
