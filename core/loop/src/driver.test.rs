use std::sync::Arc;

use corestack_config::CompactionConfig;
use corestack_config::ConversationConfig;
use corestack_conversation::ConversationHistory;
use corestack_protocol::ContentBlock;
use corestack_protocol::CreateMessageResponse;
use corestack_protocol::EventType;
use corestack_protocol::Mode;
use corestack_protocol::Stage;
use corestack_protocol::StopReason;
use corestack_testkit::CannedToolProvider;
use corestack_testkit::ScriptedModelClient;
use corestack_tools_api::ToolExecutionResult;
use corestack_tools_api::all_tools;

use super::*;

fn config(max_iterations: u32, max_total_tokens: u64) -> LoopConfig {
    LoopConfig {
        max_iterations,
        max_total_tokens,
        default_max_output_tokens: 4096,
    }
}

fn history() -> ConversationHistory {
    let mut history = ConversationHistory::new(ConversationConfig::default(), CompactionConfig::default());
    history.append(Message::user("do the thing"));
    history
}

async fn new_loop(cfg: LoopConfig) -> (AgenticLoop, Arc<corestack_event_log::EventBus>) {
    let storage = tempfile::tempdir().expect("storage");
    let bus = corestack_testkit::new_event_bus(storage.path()).await;
    (AgenticLoop::new(bus.clone(), cfg, all_tools(), "task-1", Mode::Mission, Stage::Edit), bus)
}

fn text_response(text: &str) -> CreateMessageResponse {
    CreateMessageResponse {
        id: "msg-1".to_string(),
        content: vec![ContentBlock::Text { text: text.to_string() }],
        stop_reason: StopReason::EndTurn,
        input_tokens: Some(10),
        output_tokens: Some(5),
    }
}

#[tokio::test]
async fn ends_turn_when_model_has_no_tool_use() {
    let (agentic_loop, _bus) = new_loop(config(25, 200_000)).await;
    let client = ScriptedModelClient::new(vec![text_response("all done")]);
    let provider = CannedToolProvider::new();
    let mut hist = history();

    let result = agentic_loop
        .run(RunRequest {
            client: &client,
            tool_provider: &provider,
            history: &mut hist,
            system: None,
            model: "claude-sonnet-4-20250514",
            max_tokens: 4096,
            token_counter: None,
            on_text: None,
        })
        .await;

    assert_eq!(result.reason, TerminationReason::EndTurn);
    assert_eq!(result.final_text, "all done");
    assert_eq!(result.iterations, 1);
    assert!(result.tool_calls.is_empty());
}

#[tokio::test]
async fn executes_tool_use_then_returns_on_next_end_turn() {
    let (agentic_loop, bus) = new_loop(config(25, 200_000)).await;
    let tool_use_response = CreateMessageResponse {
        id: "msg-1".to_string(),
        content: vec![ContentBlock::ToolUse {
            tool_use_id: "call-1".to_string(),
            tool_name: "read_file".to_string(),
            input: serde_json::json!({"path": "a.ts"}),
        }],
        stop_reason: StopReason::ToolUse,
        input_tokens: Some(10),
        output_tokens: Some(5),
    };
    let client = ScriptedModelClient::new(vec![tool_use_response, text_response("finished reading")]);
    let provider = CannedToolProvider::new().with_result("read_file", ToolExecutionResult::ok("file contents"));
    let mut hist = history();

    let result = agentic_loop
        .run(RunRequest {
            client: &client,
            tool_provider: &provider,
            history: &mut hist,
            system: None,
            model: "claude-sonnet-4-20250514",
            max_tokens: 4096,
            token_counter: None,
            on_text: None,
        })
        .await;

    assert_eq!(result.reason, TerminationReason::EndTurn);
    assert_eq!(result.iterations, 2);
    assert_eq!(result.tool_calls.len(), 1);
    assert!(result.tool_calls[0].success);
    assert_eq!(provider.invocations().await.len(), 1);

    let starts = bus.store().get_by_type(EventType::ToolStart).await;
    let ends = bus.store().get_by_type(EventType::ToolEnd).await;
    assert_eq!(starts.len(), 1);
    assert_eq!(ends.len(), 1);

    let messages = hist.get_messages();
    assert_eq!(messages.len(), 4);
}

#[tokio::test]
async fn stops_at_max_iterations_without_reaching_end_turn() {
    let (agentic_loop, _bus) = new_loop(config(1, 200_000)).await;
    let tool_use_response = CreateMessageResponse {
        id: "msg-1".to_string(),
        content: vec![ContentBlock::ToolUse {
            tool_use_id: "call-1".to_string(),
            tool_name: "run_command".to_string(),
            input: serde_json::json!({"command": "echo hi"}),
        }],
        stop_reason: StopReason::ToolUse,
        input_tokens: Some(1),
        output_tokens: Some(1),
    };
    let client = ScriptedModelClient::new(vec![tool_use_response]);
    let provider = CannedToolProvider::new();
    let mut hist = history();

    let result = agentic_loop
        .run(RunRequest {
            client: &client,
            tool_provider: &provider,
            history: &mut hist,
            system: None,
            model: "claude-sonnet-4-20250514",
            max_tokens: 4096,
            token_counter: None,
            on_text: None,
        })
        .await;

    assert_eq!(result.reason, TerminationReason::MaxIterations);
    assert_eq!(result.iterations, 1);
}

#[tokio::test]
async fn stops_when_cumulative_tokens_exceed_budget() {
    let (agentic_loop, _bus) = new_loop(config(25, 12)).await;
    let response = CreateMessageResponse {
        id: "msg-1".to_string(),
        content: vec![ContentBlock::Text { text: "partial".to_string() }],
        stop_reason: StopReason::EndTurn,
        input_tokens: Some(10),
        output_tokens: Some(10),
    };
    let client = ScriptedModelClient::new(vec![response]);
    let provider = CannedToolProvider::new();
    let mut hist = history();

    let result = agentic_loop
        .run(RunRequest {
            client: &client,
            tool_provider: &provider,
            history: &mut hist,
            system: None,
            model: "claude-sonnet-4-20250514",
            max_tokens: 4096,
            token_counter: None,
            on_text: None,
        })
        .await;

    assert_eq!(result.reason, TerminationReason::MaxTokens);
    assert_eq!(result.final_text, "partial");
}

#[tokio::test]
async fn transport_error_terminates_with_error_reason() {
    let (agentic_loop, _bus) = new_loop(config(25, 200_000)).await;
    let client = ScriptedModelClient::scripted(vec![Err("connection reset".to_string())]);
    let provider = CannedToolProvider::new();
    let mut hist = history();

    let result = agentic_loop
        .run(RunRequest {
            client: &client,
            tool_provider: &provider,
            history: &mut hist,
            system: None,
            model: "claude-sonnet-4-20250514",
            max_tokens: 4096,
            token_counter: None,
            on_text: None,
        })
        .await;

    assert_eq!(result.reason, TerminationReason::Error);
}
