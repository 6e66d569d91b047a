use std::sync::Arc;

use corestack_error::ErrorExt;
use corestack_error::StatusCode;
use corestack_protocol::EventType;
use corestack_protocol::LocalFileSystem;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

async fn new_controller(storage: &std::path::Path) -> (AutonomyController, Arc<corestack_event_log::EventBus>) {
    let bus = corestack_testkit::new_event_bus(storage).await;
    let fs = Arc::new(LocalFileSystem);
    let checkpoint = Arc::new(CheckpointManager::new(bus.clone(), fs, storage.join("checkpoints")));
    (AutonomyController::new(bus.clone(), checkpoint), bus)
}

fn full_preconditions() -> Preconditions {
    Preconditions {
        mode_is_mission: true,
        plan_approved: true,
        tools_approved: true,
        checkpoint_capability: true,
    }
}

#[tokio::test]
async fn start_fails_with_missing_preconditions_and_mutates_nothing() {
    let storage = tempfile::tempdir().expect("storage");
    let (controller, _bus) = new_controller(storage.path()).await;

    let result = controller
        .start("task-1", Mode::Mission, Stage::Edit, AutonomyBudgetsConfig::default(), vec![], Preconditions::default())
        .await;

    let error = result.expect_err("missing preconditions should fail");
    assert_eq!(error.status_code(), StatusCode::AutonomyPreconditionFailed);
    assert_eq!(controller.status("task-1").await, AutonomyStatus::Idle);
}

#[tokio::test]
async fn start_succeeds_and_emits_autonomy_started() {
    let storage = tempfile::tempdir().expect("storage");
    let (controller, bus) = new_controller(storage.path()).await;

    controller
        .start("task-1", Mode::Mission, Stage::Edit, AutonomyBudgetsConfig::default(), vec![], full_preconditions())
        .await
        .expect("start");

    assert_eq!(controller.status("task-1").await, AutonomyStatus::Running);
    let events = bus.store().get_by_type(EventType::AutonomyStarted).await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn execute_iteration_checkpoints_then_succeeds() {
    let storage = tempfile::tempdir().expect("storage");
    let (controller, bus) = new_controller(storage.path()).await;
    controller
        .start("task-1", Mode::Mission, Stage::Edit, AutonomyBudgetsConfig::default(), vec![], full_preconditions())
        .await
        .expect("start");

    let should_retry = controller
        .execute_iteration("task-1", Mode::Mission, Stage::Edit, || async { Ok(()) })
        .await;

    assert!(!should_retry);
    let started = bus.store().get_by_type(EventType::IterationStarted).await;
    let succeeded = bus.store().get_by_type(EventType::IterationSucceeded).await;
    let checkpoints = bus.store().get_by_type(EventType::CheckpointCreated).await;
    assert_eq!(started.len(), 1);
    assert_eq!(succeeded.len(), 1);
    assert_eq!(checkpoints.len(), 1);
}

#[tokio::test]
async fn execute_iteration_retries_on_failure_then_exhausts_budget() {
    let storage = tempfile::tempdir().expect("storage");
    let (controller, bus) = new_controller(storage.path()).await;
    let budgets = AutonomyBudgetsConfig {
        max_iterations: 2,
        max_wall_time_secs: 3600,
        max_tool_calls: 100,
    };
    controller
        .start("task-1", Mode::Mission, Stage::Edit, budgets, vec![], full_preconditions())
        .await
        .expect("start");

    let first = controller
        .execute_iteration("task-1", Mode::Mission, Stage::Edit, || async { Err("boom".to_string()) })
        .await;
    assert!(first, "should allow a retry after the first failure");

    let second = controller
        .execute_iteration("task-1", Mode::Mission, Stage::Edit, || async { Err("boom again".to_string()) })
        .await;
    assert!(!second, "budget exhausted, caller must stop");

    assert_eq!(controller.status("task-1").await, AutonomyStatus::BudgetExhausted);
    let exhausted = bus.store().get_by_type(EventType::BudgetExhausted).await;
    assert_eq!(exhausted.len(), 1);

    let third = controller
        .execute_iteration("task-1", Mode::Mission, Stage::Edit, || async { Ok(()) })
        .await;
    assert!(!third, "a budget-exhausted session never runs again");
}

#[tokio::test]
async fn pause_resume_roundtrip() {
    let storage = tempfile::tempdir().expect("storage");
    let (controller, bus) = new_controller(storage.path()).await;
    controller
        .start("task-1", Mode::Mission, Stage::Edit, AutonomyBudgetsConfig::default(), vec![], full_preconditions())
        .await
        .expect("start");

    controller.pause("task-1", Mode::Mission, Stage::Edit).await.expect("pause");
    assert_eq!(controller.status("task-1").await, AutonomyStatus::Paused);

    let second_pause = controller.pause("task-1", Mode::Mission, Stage::Edit).await;
    assert!(second_pause.is_err(), "cannot pause a paused session");

    controller.resume("task-1", Mode::Mission, Stage::Edit).await.expect("resume");
    assert_eq!(controller.status("task-1").await, AutonomyStatus::Running);

    let paused_events = bus.store().get_by_type(EventType::ExecutionPaused).await;
    let resumed_events = bus.store().get_by_type(EventType::ExecutionResumed).await;
    assert_eq!(paused_events.len(), 1);
    assert_eq!(resumed_events.len(), 1);
}

#[tokio::test]
async fn halt_is_idempotent() {
    let storage = tempfile::tempdir().expect("storage");
    let (controller, bus) = new_controller(storage.path()).await;
    controller
        .start("task-1", Mode::Mission, Stage::Edit, AutonomyBudgetsConfig::default(), vec![], full_preconditions())
        .await
        .expect("start");

    controller.halt("task-1", Mode::Mission, Stage::Edit, "user cancelled").await;
    controller.halt("task-1", Mode::Mission, Stage::Edit, "user cancelled again").await;

    assert_eq!(controller.status("task-1").await, AutonomyStatus::Halted);
    let halted_events = bus.store().get_by_type(EventType::AutonomyHalted).await;
    assert_eq!(halted_events.len(), 1);
}

#[tokio::test]
async fn complete_requires_a_running_or_paused_session() {
    let storage = tempfile::tempdir().expect("storage");
    let (controller, bus) = new_controller(storage.path()).await;

    let missing = controller.complete("task-1", Mode::Mission, Stage::Edit).await;
    assert!(missing.is_err());

    controller
        .start("task-1", Mode::Mission, Stage::Edit, AutonomyBudgetsConfig::default(), vec![], full_preconditions())
        .await
        .expect("start");
    controller.complete("task-1", Mode::Mission, Stage::Edit).await.expect("complete");
    assert_eq!(controller.status("task-1").await, AutonomyStatus::Completed);

    let completed_events = bus.store().get_by_type(EventType::AutonomyCompleted).await;
    assert_eq!(completed_events.len(), 1);
}

#[tokio::test]
async fn get_budgets_remaining_reflects_iteration_and_tool_call_usage() {
    let storage = tempfile::tempdir().expect("storage");
    let (controller, _bus) = new_controller(storage.path()).await;
    let budgets = AutonomyBudgetsConfig {
        max_iterations: 5,
        max_wall_time_secs: 3600,
        max_tool_calls: 10,
    };
    controller
        .start("task-1", Mode::Mission, Stage::Edit, budgets, vec![], full_preconditions())
        .await
        .expect("start");

    controller.increment_tool_calls("task-1", 4).await;
    controller
        .execute_iteration("task-1", Mode::Mission, Stage::Edit, || async { Ok(()) })
        .await;

    let remaining = controller.get_budgets_remaining("task-1").await.expect("remaining");
    assert_eq!(remaining.iterations_remaining, 4);
    assert_eq!(remaining.tool_calls_remaining, 6);
}
