use super::*;

#[test]
fn default_config_matches_spec_full_defaults() {
    let config = CoreStackConfig::default();
    assert_eq!(config.verify.mode, VerifyMode::Prompt);
    assert_eq!(config.autonomy.max_iterations, 10);
    assert_eq!(config.loop_config.max_iterations, 25);
    assert_eq!(config.loop_config.max_total_tokens, 200_000);
    assert_eq!(config.compaction.trigger_ratio, 0.75);
    assert_eq!(config.compaction.llm_summary_from_compaction, 3);
}

#[test]
fn serializes_and_round_trips() {
    let config = CoreStackConfig::default();
    let json = serde_json::to_string(&config).expect("serialize");
    let restored: CoreStackConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored.verify.mode, config.verify.mode);
    assert_eq!(restored.autonomy.max_tool_calls, config.autonomy.max_tool_calls);
}
