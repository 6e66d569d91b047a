use std::sync::Arc;

use corestack_protocol::LocalFileSystem;
use corestack_protocol::Mode;
use corestack_protocol::RestoreMethod;
use corestack_protocol::Stage;

use super::*;

async fn new_manager(_workspace: &Path, storage: &Path) -> CheckpointManager {
    let store = Arc::new(
        corestack_event_log::EventStore::open(storage.join("events.jsonl"))
            .await
            .expect("open store"),
    );
    let bus = Arc::new(EventBus::new(store));
    CheckpointManager::new(bus, Arc::new(LocalFileSystem), storage.join("checkpoints"))
}

#[tokio::test]
async fn p5_restore_is_byte_identical_across_two_restores() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(workspace.path(), storage.path()).await;

    let file_path = workspace.path().join("a.txt");
    tokio::fs::write(&file_path, "original").await.expect("seed");

    let checkpoint_id = manager
        .create_checkpoint(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "before edit",
            &[file_path.clone()],
            RestoreMethod::Snapshot,
        )
        .await
        .expect("create checkpoint");

    tokio::fs::write(&file_path, "mutated").await.expect("mutate");

    manager
        .restore_checkpoint(&checkpoint_id, "task-1", Mode::Mission, Stage::Edit)
        .await
        .expect("restore 1");
    let first = tokio::fs::read_to_string(&file_path).await.expect("read 1");

    tokio::fs::write(&file_path, "mutated-again").await.expect("mutate again");
    manager
        .restore_checkpoint(&checkpoint_id, "task-1", Mode::Mission, Stage::Edit)
        .await
        .expect("restore 2");
    let second = tokio::fs::read_to_string(&file_path).await.expect("read 2");

    assert_eq!(first, "original");
    assert_eq!(second, "original");
}

#[tokio::test]
async fn restore_reloads_from_disk_after_process_restart() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let file_path = workspace.path().join("a.txt");
    tokio::fs::write(&file_path, "original").await.expect("seed");

    let checkpoint_id = {
        let manager = new_manager(workspace.path(), storage.path()).await;
        manager
            .create_checkpoint(
                "task-1",
                Mode::Mission,
                Stage::Edit,
                "before edit",
                &[file_path.clone()],
                RestoreMethod::Snapshot,
            )
            .await
            .expect("create checkpoint")
    };

    tokio::fs::write(&file_path, "mutated").await.expect("mutate");

    // Fresh manager instance: snapshot map starts empty, forcing the
    // disk-load path inside `restore_checkpoint`.
    let manager = new_manager(workspace.path(), storage.path()).await;
    manager
        .restore_checkpoint(&checkpoint_id, "task-1", Mode::Mission, Stage::Edit)
        .await
        .expect("restore from disk");
    let restored = tokio::fs::read_to_string(&file_path).await.expect("read");
    assert_eq!(restored, "original");
}

#[tokio::test]
async fn restore_deletes_a_path_in_scope_that_did_not_exist_at_checkpoint_time() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(workspace.path(), storage.path()).await;

    let existing_path = workspace.path().join("a.txt");
    let new_path = workspace.path().join("new.txt");
    tokio::fs::write(&existing_path, "original").await.expect("seed");
    assert!(!tokio::fs::try_exists(&new_path).await.expect("check new"));

    let checkpoint_id = manager
        .create_checkpoint(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "before create",
            &[existing_path.clone(), new_path.clone()],
            RestoreMethod::Snapshot,
        )
        .await
        .expect("create checkpoint");

    // Simulate the later `create` entry succeeding before a rollback.
    tokio::fs::write(&new_path, "brand-new").await.expect("create new");
    assert!(tokio::fs::try_exists(&new_path).await.expect("check created"));

    manager
        .restore_checkpoint(&checkpoint_id, "task-1", Mode::Mission, Stage::Edit)
        .await
        .expect("restore");

    assert_eq!(tokio::fs::read_to_string(&existing_path).await.expect("read existing"), "original");
    assert!(!tokio::fs::try_exists(&new_path).await.expect("check new after restore"));
}

#[tokio::test]
async fn git_method_is_not_implemented() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(workspace.path(), storage.path()).await;

    let result = manager
        .create_checkpoint(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "desc",
            &[],
            RestoreMethod::Git,
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn restoring_unknown_checkpoint_fails() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(workspace.path(), storage.path()).await;

    let result = manager
        .restore_checkpoint("missing-id", "task-1", Mode::Mission, Stage::Edit)
        .await;
    assert!(result.is_err());
}
