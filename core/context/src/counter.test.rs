use corestack_protocol::Message;

use super::*;

#[tokio::test]
async fn always_reports_is_estimate() {
    let counter = CharCountTokenCounter;
    let messages = vec![Message::user("hello there")];
    let result = counter
        .count_tokens(CountTokensRequest {
            messages: &messages,
            system: None,
            tools: None,
            model: "claude-sonnet-4-20250514",
        })
        .await
        .expect("count");
    assert!(result.is_estimate);
    assert!(result.input_tokens > 0);
}

#[tokio::test]
async fn counts_a_fixed_cost_per_tool_schema() {
    let counter = CharCountTokenCounter;
    let messages = vec![Message::user("hi")];
    let tools = vec![serde_json::json!({"name": "read_file"}), serde_json::json!({"name": "write_file"})];
    let without = counter
        .count_tokens(CountTokensRequest {
            messages: &messages,
            system: None,
            tools: None,
            model: "claude-sonnet-4-20250514",
        })
        .await
        .expect("count");
    let with = counter
        .count_tokens(CountTokensRequest {
            messages: &messages,
            system: None,
            tools: Some(&tools),
            model: "claude-sonnet-4-20250514",
        })
        .await
        .expect("count");
    assert!(with.input_tokens > without.input_tokens);
}
