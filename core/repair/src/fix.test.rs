use std::sync::Arc;

use corestack_checkpoint::CheckpointManager;
use corestack_context::SnapshotManager;
use corestack_diff::DiffManager;
use corestack_protocol::ContentBlock;
use corestack_protocol::CreateMessageResponse;
use corestack_protocol::LocalFileSystem;
use corestack_protocol::Mode;
use corestack_protocol::ModelClient;
use corestack_protocol::Stage;
use corestack_protocol::StopReason;
use corestack_testkit::ScriptedModelClient;
use corestack_testkit::TempWorkspace;
use corestack_testkit::new_event_bus;

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

fn diagnosis() -> Diagnosis {
    Diagnosis {
        source: DiagnosisSource::Heuristic { llm_rejected_reason: None },
        failure_summary: "boom".to_string(),
        likely_causes: vec!["bad logic".to_string()],
        affected_files: vec!["src/lib.rs".to_string()],
        root_cause_file: Some("src/lib.rs".to_string()),
        suggested_fix_approach: "patch the function".to_string(),
        confidence: Some(0.5),
    }
}

async fn diff_manager(workspace: &TempWorkspace) -> DiffManager {
    let bus = new_event_bus(&workspace.storage_path()).await;
    let fs = Arc::new(LocalFileSystem);
    let checkpoint = Arc::new(CheckpointManager::new(bus.clone(), fs.clone(), workspace.storage_path().join("checkpoints")));
    let snapshot = Arc::new(SnapshotManager::new(bus.clone(), fs.clone()));
    DiffManager::new(bus, fs, checkpoint, snapshot, workspace.workspace_path(), workspace.storage_path().join("evidence"))
}

#[tokio::test]
async fn no_model_produces_heuristic_doc_entry() {
    let workspace = TempWorkspace::new().expect("workspace");
    let diff = diff_manager(&workspace).await;
    let diagnosis = diagnosis();

    let proposal = propose_repair_fix(None, &LocalFileSystem, &diff, &workspace.workspace_path(), &diagnosis, "task-1", Mode::Mission, Stage::Repair, "step-1")
        .await
        .expect("propose_repair_fix");

    assert_eq!(proposal.source, FixSource::Heuristic);
    assert_eq!(proposal.entries.len(), 1);
    assert!(proposal.entries[0].path.starts_with("docs/repair_attempt_"));
}

#[tokio::test]
async fn well_formed_model_response_modifies_existing_file() {
    let workspace = TempWorkspace::new().expect("workspace");
    tokio::fs::write(workspace.workspace_path().join("src.rs"), b"old content").await.expect("seed file");
    let diff = diff_manager(&workspace).await;
    let diagnosis = diagnosis();

    let json = r#"{"touched_files": [{"path": "src.rs", "new_content": "new content"}], "explanation": "fixed it", "confidence": 0.9}"#;
    let client: Arc<dyn ModelClient> = Arc::new(ScriptedModelClient::new(vec![text_response(json)]));

    let proposal = propose_repair_fix(Some(&client), &LocalFileSystem, &diff, &workspace.workspace_path(), &diagnosis, "task-1", Mode::Mission, Stage::Repair, "step-1")
        .await
        .expect("propose_repair_fix");

    assert_eq!(proposal.source, FixSource::Llm);
    assert_eq!(proposal.entries.len(), 1);
    assert!(proposal.entries[0].pre_change_hash.is_some());
}

#[tokio::test]
async fn model_response_for_missing_file_creates_it() {
    let workspace = TempWorkspace::new().expect("workspace");
    let diff = diff_manager(&workspace).await;
    let diagnosis = diagnosis();

    let json = r#"{"touched_files": [{"path": "new.rs", "new_content": "content"}], "explanation": "added file"}"#;
    let client: Arc<dyn ModelClient> = Arc::new(ScriptedModelClient::new(vec![text_response(json)]));

    let proposal = propose_repair_fix(Some(&client), &LocalFileSystem, &diff, &workspace.workspace_path(), &diagnosis, "task-1", Mode::Mission, Stage::Repair, "step-1")
        .await
        .expect("propose_repair_fix");

    assert!(proposal.entries[0].pre_change_hash.is_none());
}

#[tokio::test]
async fn malformed_model_response_falls_back_to_heuristic() {
    let workspace = TempWorkspace::new().expect("workspace");
    let diff = diff_manager(&workspace).await;
    let diagnosis = diagnosis();

    let client: Arc<dyn ModelClient> = Arc::new(ScriptedModelClient::new(vec![text_response("garbage")]));

    let proposal = propose_repair_fix(Some(&client), &LocalFileSystem, &diff, &workspace.workspace_path(), &diagnosis, "task-1", Mode::Mission, Stage::Repair, "step-1")
        .await
        .expect("propose_repair_fix");

    assert_eq!(proposal.source, FixSource::Heuristic);
}
