use std::sync::Arc;

use corestack_checkpoint::CheckpointManager;
use corestack_context::SnapshotManager;
use corestack_protocol::DiffOperation;
use corestack_protocol::EventType;
use corestack_protocol::LocalFileSystem;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

async fn new_manager(storage: &std::path::Path) -> (DiffManager, Arc<corestack_event_log::EventBus>) {
    new_manager_rooted(storage, storage).await
}

async fn new_manager_rooted(storage: &std::path::Path, workspace_root: &std::path::Path) -> (DiffManager, Arc<corestack_event_log::EventBus>) {
    let bus = corestack_testkit::new_event_bus(storage).await;
    let fs = Arc::new(LocalFileSystem);
    let checkpoint = Arc::new(CheckpointManager::new(bus.clone(), fs.clone(), storage.join("checkpoints")));
    let snapshot = Arc::new(SnapshotManager::new(bus.clone(), fs.clone()));
    (DiffManager::new(bus.clone(), fs, checkpoint, snapshot, workspace_root, storage.join("evidence")), bus)
}

fn create_entry(path: &str, content: &str) -> DiffEntry {
    DiffEntry {
        path: path.to_string(),
        operation: DiffOperation::Create,
        new_content: Some(content.as_bytes().to_vec()),
        pre_change_hash: None,
    }
}

#[tokio::test]
async fn propose_then_apply_writes_all_entries() {
    let storage = tempfile::tempdir().expect("storage");
    let workspace = tempfile::tempdir().expect("workspace");
    let (manager, bus) = new_manager(storage.path()).await;

    let a_path = workspace.path().join("a.ts");
    let b_path = workspace.path().join("b.ts");
    let files = vec![
        create_entry(a_path.to_str().expect("utf8"), "export const a = 1;\n"),
        create_entry(b_path.to_str().expect("utf8"), "export const b = 2;\n"),
    ];

    let diff_id = manager
        .propose_diff(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "step-1",
            "add two constants",
            "add a.ts and b.ts",
            vec![],
            files,
            true,
            Some(0.9),
        )
        .await
        .expect("propose");

    manager
        .apply_diff(&diff_id, "task-1", Mode::Mission, Stage::Edit)
        .await
        .expect("apply");

    assert_eq!(tokio::fs::read_to_string(&a_path).await.expect("read a"), "export const a = 1;\n");
    assert_eq!(tokio::fs::read_to_string(&b_path).await.expect("read b"), "export const b = 2;\n");

    let events = bus.store().get_by_type(EventType::DiffApplied).await;
    assert_eq!(events.len(), 1);
    let events = bus.store().get_by_type(EventType::DiffProposed).await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn stale_pre_change_hash_aborts_apply_with_no_diff_applied_event() {
    let storage = tempfile::tempdir().expect("storage");
    let workspace = tempfile::tempdir().expect("workspace");
    let (manager, bus) = new_manager(storage.path()).await;

    let path = workspace.path().join("a.ts");
    tokio::fs::write(&path, "original").await.expect("seed");

    let entry = DiffEntry {
        path: path.to_str().expect("utf8").to_string(),
        operation: DiffOperation::Modify,
        new_content: Some(b"modified by model".to_vec()),
        pre_change_hash: Some("deadbeef".to_string()),
    };

    let diff_id = manager
        .propose_diff(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "step-1",
            "update a.ts",
            "update a.ts",
            vec![],
            vec![entry],
            false,
            None,
        )
        .await
        .expect("propose");

    let result = manager.apply_diff(&diff_id, "task-1", Mode::Mission, Stage::Edit).await;
    assert!(result.is_err());
    assert_eq!(tokio::fs::read_to_string(&path).await.expect("read"), "original");

    let applied = bus.store().get_by_type(EventType::DiffApplied).await;
    assert!(applied.is_empty());
}

#[tokio::test]
async fn write_failure_mid_apply_restores_prior_entries_via_checkpoint() {
    let storage = tempfile::tempdir().expect("storage");
    let workspace = tempfile::tempdir().expect("workspace");
    let (manager, bus) = new_manager(storage.path()).await;

    let a_path = workspace.path().join("a.ts");
    let c_path = workspace.path().join("c.ts");
    tokio::fs::write(&a_path, "a-original").await.expect("seed a");
    tokio::fs::create_dir(&c_path).await.expect("seed c as dir");

    let files = vec![
        DiffEntry {
            path: a_path.to_str().expect("utf8").to_string(),
            operation: DiffOperation::Create,
            new_content: Some(b"a-mutated".to_vec()),
            pre_change_hash: None,
        },
        DiffEntry {
            path: c_path.to_str().expect("utf8").to_string(),
            operation: DiffOperation::Create,
            new_content: Some(b"c-mutated".to_vec()),
            pre_change_hash: None,
        },
    ];

    let diff_id = manager
        .propose_diff(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "step-1",
            "mutate a then fail on c",
            "mutate a, c",
            vec![],
            files,
            true,
            None,
        )
        .await
        .expect("propose");

    let result = manager.apply_diff(&diff_id, "task-1", Mode::Mission, Stage::Edit).await;
    assert!(result.is_err());
    assert_eq!(tokio::fs::read_to_string(&a_path).await.expect("read a"), "a-original");

    let applied = bus.store().get_by_type(EventType::DiffApplied).await;
    assert!(applied.is_empty());
    let restored = bus.store().get_by_type(EventType::CheckpointRestored).await;
    assert_eq!(restored.len(), 1);
}

#[tokio::test]
async fn rollback_deletes_a_newly_created_file_that_had_no_pre_apply_content() {
    let storage = tempfile::tempdir().expect("storage");
    let workspace = tempfile::tempdir().expect("workspace");
    let (manager, bus) = new_manager(storage.path()).await;

    let new_path = workspace.path().join("new.ts");
    let c_path = workspace.path().join("c.ts");
    tokio::fs::create_dir(&c_path).await.expect("seed c as dir");
    assert!(!tokio::fs::try_exists(&new_path).await.expect("check new"));

    let files = vec![
        DiffEntry {
            path: new_path.to_str().expect("utf8").to_string(),
            operation: DiffOperation::Create,
            new_content: Some(b"brand-new".to_vec()),
            pre_change_hash: None,
        },
        DiffEntry {
            path: c_path.to_str().expect("utf8").to_string(),
            operation: DiffOperation::Create,
            new_content: Some(b"c-mutated".to_vec()),
            pre_change_hash: None,
        },
    ];

    let diff_id = manager
        .propose_diff(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "step-1",
            "create new.ts then fail on c",
            "create new.ts, c",
            vec![],
            files,
            true,
            None,
        )
        .await
        .expect("propose");

    let result = manager.apply_diff(&diff_id, "task-1", Mode::Mission, Stage::Edit).await;
    assert!(result.is_err());

    // The first entry's write succeeded before the second entry failed;
    // rollback must undo it, not just leave pre-existing files alone.
    assert!(!tokio::fs::try_exists(&new_path).await.expect("check new"));

    let applied = bus.store().get_by_type(EventType::DiffApplied).await;
    assert!(applied.is_empty());
}

#[tokio::test]
async fn reject_diff_emits_diff_rejected() {
    let storage = tempfile::tempdir().expect("storage");
    let (manager, bus) = new_manager(storage.path()).await;

    manager.reject_diff("diff-x", "user declined", "task-1", Mode::Mission, Stage::Edit).await;

    let events = bus.store().get_by_type(EventType::DiffRejected).await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn relative_entry_path_resolves_against_workspace_root() {
    let storage = tempfile::tempdir().expect("storage");
    let workspace = tempfile::tempdir().expect("workspace");
    let (manager, _bus) = new_manager_rooted(storage.path(), workspace.path()).await;

    let entry = create_entry("docs/repair_attempt.md", "# repair\n");
    let diff_id = manager
        .propose_diff(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "step-1",
            "write repair note",
            "write repair note",
            vec![],
            vec![entry],
            true,
            None,
        )
        .await
        .expect("propose");

    manager
        .apply_diff(&diff_id, "task-1", Mode::Mission, Stage::Edit)
        .await
        .expect("apply");

    let written = tokio::fs::read_to_string(workspace.path().join("docs/repair_attempt.md")).await.expect("read under workspace root");
    assert_eq!(written, "# repair\n");
}

#[tokio::test]
async fn path_outside_workspace_is_rejected_at_propose_time() {
    let storage = tempfile::tempdir().expect("storage");
    let (manager, _bus) = new_manager(storage.path()).await;

    let entry = create_entry("../escape.ts", "malicious");
    let result = manager
        .propose_diff(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "step-1",
            "escape attempt",
            "escape attempt",
            vec![],
            vec![entry],
            false,
            None,
        )
        .await;

    assert!(result.is_err());
}
