use corestack_protocol::Content;

use super::*;

#[test]
fn extracts_file_paths_commands_errors_and_decisions() {
    let config = CompactionConfig::default();
    let messages = vec![
        Message::user("Please fix src/main.rs"),
        Message::assistant(Content::Text(
            "$ cargo test\nerror: expected `;`\nI decided to use the builder pattern."
                .to_string(),
        )),
    ];
    let facts = extract_key_facts(&messages, &config);
    assert!(facts.contains(&KeyFact::FilePath("src/main.rs".to_string())));
    assert!(facts.contains(&KeyFact::Command("cargo test".to_string())));
    assert!(facts.iter().any(|f| matches!(f, KeyFact::Error(e) if e.contains("expected"))));
    assert!(facts.iter().any(|f| matches!(f, KeyFact::Decision(_))));
}

#[test]
fn caps_errors_at_configured_recent_count() {
    let config = CompactionConfig::default();
    let lines: Vec<String> = (0..10).map(|i| format!("error: failure number {i}")).collect();
    let messages = vec![Message::assistant(Content::Text(lines.join("\n")))];
    let facts = extract_key_facts(&messages, &config);
    let errors: Vec<_> = facts
        .iter()
        .filter(|f| matches!(f, KeyFact::Error(_)))
        .collect();
    assert_eq!(errors.len(), config.max_errors);
    assert!(matches!(errors.last(), Some(KeyFact::Error(e)) if e.contains("number 9")));
}

#[test]
fn caps_total_facts_at_configured_max() {
    let config = CompactionConfig::default();
    let lines: Vec<String> = (0..50).map(|i| format!("/repo/file_{i}.rs")).collect();
    let messages = vec![Message::user(Content::Text(lines.join("\n")))];
    let facts = extract_key_facts(&messages, &config);
    assert_eq!(facts.len(), config.max_facts);
}

#[test]
fn render_summary_groups_facts_by_category() {
    let facts = vec![
        KeyFact::FilePath("src/lib.rs".to_string()),
        KeyFact::Command("cargo build".to_string()),
    ];
    let rendered = render_summary(&facts);
    assert!(rendered.contains("Files touched"));
    assert!(rendered.contains("src/lib.rs"));
    assert!(rendered.contains("Commands run"));
    assert!(!rendered.contains("Errors encountered"));
}

#[test]
fn render_summary_handles_no_facts() {
    let rendered = render_summary(&[]);
    assert!(!rendered.is_empty());
}
