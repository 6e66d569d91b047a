use std::sync::Arc;

use corestack_protocol::ContentBlock;
use corestack_protocol::CreateMessageResponse;
use corestack_protocol::ModelClient;
use corestack_protocol::StopReason;
use corestack_testkit::ScriptedModelClient;

use super::*;

fn text_response(text: &str) -> CreateMessageResponse {
    CreateMessageResponse {
        id: "resp-1".to_string(),
        content: vec![ContentBlock::Text { text: text.to_string() }],
        stop_reason: StopReason::EndTurn,
        input_tokens: Some(10),
        output_tokens: Some(20),
    }
}

fn failure(stderr: &str) -> TestFailureRecord {
    TestFailureRecord {
        command: "cargo test".to_string(),
        exit_code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
        summary: "test failure".to_string(),
    }
}

#[tokio::test]
async fn no_model_uses_heuristic_path() {
    let diagnosis = diagnose_failure(None, &failure("error in src/lib.rs at line 4")).await.expect("diagnose");
    assert!(matches!(diagnosis.source, DiagnosisSource::Heuristic { llm_rejected_reason: None }));
    assert_eq!(diagnosis.affected_files, vec!["src/lib.rs".to_string()]);
}

#[tokio::test]
async fn heuristic_path_without_matching_files_uses_placeholder() {
    let diagnosis = diagnose_failure(None, &failure("assertion failed")).await.expect("diagnose");
    assert_eq!(diagnosis.failure_summary, "unknown — check test output");
}

#[tokio::test]
async fn well_formed_model_response_is_used_as_is() {
    let json = r#"{"failure_summary": "off by one", "likely_causes": ["index bug"], "affected_files": ["src/x.rs"], "root_cause_file": "src/x.rs", "suggested_fix_approach": "fix the bound", "confidence": 0.8}"#;
    let client: Arc<dyn ModelClient> = Arc::new(ScriptedModelClient::new(vec![text_response(json)]));

    let diagnosis = diagnose_failure(Some(&client), &failure("boom")).await.expect("diagnose");
    assert!(matches!(diagnosis.source, DiagnosisSource::Llm));
    assert_eq!(diagnosis.failure_summary, "off by one");
    assert_eq!(diagnosis.root_cause_file.as_deref(), Some("src/x.rs"));
}

#[tokio::test]
async fn malformed_model_response_falls_back_to_heuristic() {
    let client: Arc<dyn ModelClient> = Arc::new(ScriptedModelClient::new(vec![text_response("not json at all")]));

    let diagnosis = diagnose_failure(Some(&client), &failure("error in src/main.rs")).await.expect("diagnose");
    assert!(matches!(diagnosis.source, DiagnosisSource::Heuristic { .. }));
}

#[tokio::test]
async fn max_tokens_stop_reason_falls_back_to_heuristic() {
    let response = CreateMessageResponse {
        stop_reason: StopReason::MaxTokens,
        ..text_response(r#"{"failure_summary": "x"}"#)
    };
    let client: Arc<dyn ModelClient> = Arc::new(ScriptedModelClient::new(vec![response]));

    let diagnosis = diagnose_failure(Some(&client), &failure("error in src/main.rs")).await.expect("diagnose");
    assert!(matches!(diagnosis.source, DiagnosisSource::Heuristic { .. }));
}

#[tokio::test]
async fn transport_error_propagates() {
    let client: Arc<dyn ModelClient> = Arc::new(ScriptedModelClient::scripted(vec![Err("connection reset".to_string())]));

    let result = diagnose_failure(Some(&client), &failure("boom")).await;
    assert!(result.is_err());
}
