use std::sync::Arc;

use corestack_protocol::LocalFileSystem;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

async fn new_manager(storage: &std::path::Path) -> SnapshotManager {
    let store = Arc::new(
        corestack_event_log::EventStore::open(storage.join("events.jsonl"))
            .await
            .expect("open store"),
    );
    let bus = Arc::new(EventBus::new(store));
    SnapshotManager::new(bus, Arc::new(LocalFileSystem))
}

#[tokio::test]
async fn create_snapshot_hashes_the_given_line_range() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    let file_path = workspace.path().join("a.rs");
    tokio::fs::write(&file_path, "line one\nline two\nline three\n").await.expect("seed");

    let snapshot = manager
        .create_snapshot(
            "task-1",
            Mode::Mission,
            Stage::Retrieve,
            file_path.to_str().unwrap(),
            0,
            2,
        )
        .await
        .expect("create snapshot");
    assert_eq!(snapshot.line_start, 0);
    assert_eq!(snapshot.line_end, 2);
    assert!(!snapshot.content_hash.is_empty());
}

#[tokio::test]
async fn unchanged_file_is_fresh() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    let file_path = workspace.path().join("a.rs");
    tokio::fs::write(&file_path, "line one\nline two\n").await.expect("seed");
    let path_str = file_path.to_str().unwrap().to_string();

    manager
        .create_snapshot("task-1", Mode::Mission, Stage::Retrieve, &path_str, 0, 2)
        .await
        .expect("create snapshot");

    let results = manager
        .check_staleness("task-1", Mode::Mission, Stage::Edit, None)
        .await;
    assert_eq!(results.get(&path_str), Some(&Staleness::Fresh));
}

#[tokio::test]
async fn edited_file_is_stale() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    let file_path = workspace.path().join("a.rs");
    tokio::fs::write(&file_path, "line one\nline two\n").await.expect("seed");
    let path_str = file_path.to_str().unwrap().to_string();

    manager
        .create_snapshot("task-1", Mode::Mission, Stage::Retrieve, &path_str, 0, 2)
        .await
        .expect("create snapshot");

    // Sleep isn't available without real time; rewriting with different
    // content is enough to change the mtime on virtually every filesystem.
    tokio::fs::write(&file_path, "line one\nline TWO-EDITED\n").await.expect("mutate");

    let results = manager
        .check_staleness("task-1", Mode::Mission, Stage::Edit, None)
        .await;
    assert!(matches!(results.get(&path_str), Some(Staleness::Stale { .. })));
}

#[tokio::test]
async fn deleted_file_is_stale() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    let file_path = workspace.path().join("a.rs");
    tokio::fs::write(&file_path, "line one\n").await.expect("seed");
    let path_str = file_path.to_str().unwrap().to_string();

    manager
        .create_snapshot("task-1", Mode::Mission, Stage::Retrieve, &path_str, 0, 1)
        .await
        .expect("create snapshot");

    tokio::fs::remove_file(&file_path).await.expect("delete");

    let results = manager
        .check_staleness("task-1", Mode::Mission, Stage::Edit, None)
        .await;
    assert!(matches!(results.get(&path_str), Some(Staleness::Stale { .. })));
}

#[tokio::test]
async fn invalidate_removes_a_tracked_snapshot() {
    let workspace = tempfile::tempdir().expect("workspace");
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    let file_path = workspace.path().join("a.rs");
    tokio::fs::write(&file_path, "line one\n").await.expect("seed");
    let path_str = file_path.to_str().unwrap().to_string();

    manager
        .create_snapshot("task-1", Mode::Mission, Stage::Retrieve, &path_str, 0, 1)
        .await
        .expect("create snapshot");
    manager.invalidate(&path_str).await;

    let results = manager
        .check_staleness("task-1", Mode::Mission, Stage::Edit, None)
        .await;
    assert!(results.is_empty());
}
