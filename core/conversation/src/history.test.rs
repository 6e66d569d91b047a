use corestack_protocol::Content;
use corestack_protocol::ContentBlock;

use super::*;

fn config(max_tokens: u64, min_messages: usize, chars_per_token: f64) -> ConversationConfig {
    ConversationConfig {
        max_tokens,
        min_messages,
        chars_per_token,
    }
}

// spec.md scenario S2: trim under budget.
#[test]
fn s2_trim_under_budget() {
    let mut history = ConversationHistory::new(config(10, 2, 1.0), CompactionConfig::default());
    history.append(Message::user("abcd"));
    history.append(Message::assistant("abcd"));
    history.append(Message::user("abcd"));
    history.append(Message::assistant("ab"));

    history.trim();

    let messages = history.get_messages();
    assert!(messages.len() <= 2);
    assert!(history.estimate_tokens() <= 10);
    assert!(matches!(messages[0].role, Role::User));
}

#[test]
fn trim_keeps_min_messages_even_over_budget() {
    let mut history = ConversationHistory::new(config(1, 2, 1.0), CompactionConfig::default());
    history.append(Message::user("abcdefgh"));
    history.append(Message::assistant("abcdefgh"));
    history.trim();
    assert_eq!(history.get_messages().len(), 2);
}

#[test]
fn enforce_user_head_after_trim() {
    let mut history = ConversationHistory::new(config(100, 1, 1.0), CompactionConfig::default());
    history.append(Message::user("seed"));
    history.append(Message::assistant("a"));
    // Force min_messages=1 so trim could stop with an assistant head; the
    // head-fixup pass must still remove it.
    history.trim();
    let messages = history.get_messages();
    if !messages.is_empty() {
        assert!(matches!(messages[0].role, Role::User));
    }
}

#[tokio::test]
async fn maybe_compact_replaces_prefix_with_summary_and_keeps_tail() {
    let compaction = CompactionConfig {
        tail_window: 2,
        ..CompactionConfig::default()
    };
    let mut history = ConversationHistory::new(config(1_000_000, 1, 1.0), compaction);
    for i in 0..10 {
        history.append(Message::user(format!("message {i}")));
    }
    let compacted = history.maybe_compact(1, None).await;
    assert!(compacted);

    let messages = history.get_messages();
    // synthesized summary (user) + acknowledgement (assistant) + 2-message tail.
    assert_eq!(messages.len(), 4);
    assert!(matches!(messages[0].role, Role::User));
    assert_eq!(history.compaction_count(), 1);
}

#[tokio::test]
async fn maybe_compact_is_a_no_op_below_threshold() {
    let mut history = ConversationHistory::new(config(1_000_000, 1, 1.0), CompactionConfig::default());
    history.append(Message::user("short"));
    let compacted = history.maybe_compact(1_000_000, None).await;
    assert!(!compacted);
}

struct FailingClient;
#[async_trait::async_trait]
impl SummaryClient for FailingClient {
    async fn summarize(&self, _messages: &[Message]) -> Result<String, String> {
        Err("boom".to_string())
    }
}

#[tokio::test]
async fn llm_summary_failure_falls_back_to_extractor() {
    let compaction = CompactionConfig {
        tail_window: 1,
        llm_summary_from_compaction: 0,
        llm_retry_attempts: 1,
        llm_retry_base_delay_ms: 1,
        ..CompactionConfig::default()
    };
    let mut history = ConversationHistory::new(config(1_000_000, 1, 1.0), compaction);
    for i in 0..5 {
        history.append(Message::user(format!("/repo/file_{i}.rs")));
    }
    let compacted = history.maybe_compact(1, Some(&FailingClient)).await;
    assert!(compacted);
    let messages = history.get_messages();
    if let Content::Text(text) = &messages[0].content {
        assert!(text.contains("file_"));
    }
}

#[test]
fn to_json_from_json_round_trips() {
    let mut history = ConversationHistory::new(config(100, 1, 4.0), CompactionConfig::default());
    history.append(Message::user("hello"));
    history.append(Message::assistant(Content::Blocks(vec![ContentBlock::ToolUse {
        tool_use_id: "call-1".to_string(),
        tool_name: "read_file".to_string(),
        input: serde_json::json!({"path": "a.rs"}),
    }])));

    let json = history.to_json().expect("serialize");
    let restored = ConversationHistory::from_json(&json).expect("deserialize");
    assert_eq!(restored.get_messages().len(), 2);
    assert_eq!(restored.compaction_count(), 0);
}
