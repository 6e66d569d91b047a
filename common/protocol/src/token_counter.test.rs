use crate::message::Message;

use super::*;

#[test]
fn short_text_is_never_classified_as_code() {
    assert!(!looks_like_code("fn x;"));
}

#[test]
fn code_like_text_needs_three_indicators() {
    let code = "fn main() {\n    if true { return; }\n}";
    assert!(looks_like_code(code));
}

#[test]
fn prose_is_not_classified_as_code() {
    let prose = "This is a perfectly ordinary sentence describing the plan in full.";
    assert!(!looks_like_code(prose));
}

#[test]
fn estimate_adds_per_message_overhead() {
    let messages = vec![Message::user("hi")];
    let estimated = estimate_tokens_sync(&messages, 0);
    assert!(estimated >= PER_MESSAGE_OVERHEAD as u64);
}

#[test]
fn tool_schema_count_adds_fixed_cost() {
    let messages: Vec<Message> = Vec::new();
    let estimated = estimate_tokens_sync(&messages, 2);
    assert_eq!(estimated, (2.0 * TOOL_SCHEMA_TOKENS) as u64);
}
