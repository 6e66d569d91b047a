use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use corestack_event_log::EventStore;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

async fn new_manager(storage: &std::path::Path) -> ModeManager {
    let store = Arc::new(
        EventStore::open(storage.join("events.jsonl"))
            .await
            .expect("open store"),
    );
    ModeManager::new(Arc::new(EventBus::new(store)))
}

#[tokio::test]
async fn same_mode_is_a_no_op() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;
    manager.set_mode("task-1", Mode::Answer).await;
    assert_eq!(manager.current("task-1").await.0, Mode::Answer);
    manager.set_mode("task-1", Mode::Answer).await;
    assert_eq!(manager.current("task-1").await.0, Mode::Answer);
}

struct RecordingHalter(Arc<AtomicBool>);
impl AutonomyHalter for RecordingHalter {
    fn halt(&self, _task_id: &str) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn leaving_mission_halts_running_autonomy() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;
    let halted = Arc::new(AtomicBool::new(false));
    manager.set_autonomy_halter(Arc::new(RecordingHalter(halted.clone())));

    manager.set_mode("task-1", Mode::Mission).await;
    assert!(!halted.load(Ordering::SeqCst));

    manager.set_mode("task-1", Mode::Answer).await;
    assert!(halted.load(Ordering::SeqCst));
}

#[tokio::test]
async fn answer_and_plan_transition_freely() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;
    manager.set_mode("task-1", Mode::Answer).await;
    manager.set_mode("task-1", Mode::Plan).await;
    manager.set_mode("task-1", Mode::Mission).await;
    assert_eq!(manager.current("task-1").await.0, Mode::Mission);
}

#[tokio::test]
async fn stage_follows_the_linear_mission_sequence() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;
    manager.set_stage("task-1", Stage::Intent).await.expect("intent");
    manager.set_stage("task-1", Stage::Plan).await.expect("plan");
    manager.set_stage("task-1", Stage::Retrieve).await.expect("retrieve");
    manager.set_stage("task-1", Stage::Edit).await.expect("edit");
    manager.set_stage("task-1", Stage::Verify).await.expect("verify");
    manager.set_stage("task-1", Stage::Repair).await.expect("repair");
    manager.set_stage("task-1", Stage::Edit).await.expect("back to edit");
}

#[tokio::test]
async fn non_linear_jump_is_rejected() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;
    manager.set_stage("task-1", Stage::Intent).await.expect("intent");
    let result = manager.set_stage("task-1", Stage::Verify).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn done_is_reachable_from_any_stage() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;
    manager.set_stage("task-1", Stage::Intent).await.expect("intent");
    manager.set_stage("task-1", Stage::Done).await.expect("fatal error done");
}

#[tokio::test]
async fn intent_is_always_a_valid_reset() {
    let storage = tempfile::tempdir().expect("storage");
    let manager = new_manager(storage.path()).await;
    manager.set_stage("task-1", Stage::Intent).await.expect("intent");
    manager.set_stage("task-1", Stage::Plan).await.expect("plan");
    manager.set_stage("task-1", Stage::Intent).await.expect("reset");
}
