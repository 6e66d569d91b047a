use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use corestack_event_log::EventBus;
use corestack_event_log::EventStore;
use corestack_protocol::ApprovalDecision;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

async fn new_manager(storage: &std::path::Path) -> ApprovalManager {
    let store = Arc::new(
        EventStore::open(storage.join("events.jsonl"))
            .await
            .expect("open store"),
    );
    ApprovalManager::new(Arc::new(EventBus::new(store)))
}

// spec.md scenario S3: a task blocked on an approval does not complete
// until a concurrent caller resolves it.
#[tokio::test]
async fn s3_approval_blocks_execution_until_resolved() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = Arc::new(new_manager(storage.path()).await);

    let pending = manager
        .request_approval(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "apply_diff",
            "apply 3-file diff",
            serde_json::json!({"files": 3}),
            None,
        )
        .await
        .expect("request approval");
    let approval_id = pending.approval_id.clone();

    let completed = Arc::new(AtomicBool::new(false));
    let waiter_completed = completed.clone();
    let waiter = tokio::spawn(async move {
        let resolution = pending.wait().await.expect("resolution");
        waiter_completed.store(true, Ordering::SeqCst);
        resolution
    });

    // Give the waiter a chance to start; it must still be pending.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!completed.load(Ordering::SeqCst));
    assert_eq!(manager.pending_count().await, 1);
    assert!(manager.has_pending_approvals().await);

    manager
        .resolve_approval(
            &approval_id,
            ApprovalDecision::Approved,
            None,
            None,
            "task-1",
            Mode::Mission,
            Stage::Edit,
        )
        .await;

    let resolution = waiter.await.expect("join");
    assert!(resolution.is_approved());
    assert!(completed.load(Ordering::SeqCst));
    assert_eq!(manager.pending_count().await, 0);
}

#[tokio::test]
async fn resolve_is_idempotent() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    let pending = manager
        .request_approval(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "run_command",
            "run tests",
            serde_json::json!({}),
            None,
        )
        .await
        .expect("request approval");
    let approval_id = pending.approval_id.clone();

    manager
        .resolve_approval(
            &approval_id,
            ApprovalDecision::Approved,
            None,
            None,
            "task-1",
            Mode::Mission,
            Stage::Edit,
        )
        .await;
    // Second resolution with a different decision must be a silent no-op.
    manager
        .resolve_approval(
            &approval_id,
            ApprovalDecision::Denied,
            None,
            None,
            "task-1",
            Mode::Mission,
            Stage::Edit,
        )
        .await;

    let resolution = pending.wait().await.expect("resolution");
    assert!(resolution.is_approved());
}

#[tokio::test]
async fn resolving_unknown_id_is_a_no_op() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    manager
        .resolve_approval(
            "does-not-exist",
            ApprovalDecision::Approved,
            None,
            None,
            "task-1",
            Mode::Mission,
            Stage::Edit,
        )
        .await;
    assert_eq!(manager.pending_count().await, 0);
}

#[tokio::test]
async fn too_many_pending_requests_is_rejected() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    for i in 0..MAX_PENDING_REQUESTS {
        manager
            .request_approval(
                "task-1",
                Mode::Mission,
                Stage::Edit,
                "run_command",
                format!("request {i}"),
                serde_json::json!({}),
                None,
            )
            .await
            .expect("request approval");
    }

    let result = manager
        .request_approval(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "run_command",
            "one too many",
            serde_json::json!({}),
            None,
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn timeout_elapses_without_resolution() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;

    let pending = manager
        .request_approval(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            "run_command",
            "run tests",
            serde_json::json!({}),
            Some(Duration::from_millis(20)),
        )
        .await
        .expect("request approval");

    let result = pending.wait().await;
    assert!(result.is_err());
}
