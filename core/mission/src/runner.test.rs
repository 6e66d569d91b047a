use std::sync::Arc;

use corestack_approval::ApprovalManager;
use corestack_autonomy::AutonomyController;
use corestack_checkpoint::CheckpointManager;
use corestack_config::AutonomyBudgetsConfig;
use corestack_config::VerifyMode;
use corestack_config::VerifyPolicyConfig;
use corestack_context::SnapshotManager;
use corestack_diff::DiffEntry;
use corestack_diff::DiffManager;
use corestack_mode::ModeManager;
use corestack_protocol::ApprovalDecision;
use corestack_protocol::DiffOperation;
use corestack_protocol::EventType;
use corestack_protocol::FileSystemAdapter;
use corestack_protocol::LocalFileSystem;
use corestack_protocol::Mode;
use corestack_protocol::Stage;
use corestack_testkit::TempWorkspace;
use corestack_verify::VerifyManager;

use super::*;

async fn new_context(workspace: &TempWorkspace, verify_mode: VerifyMode, command: &str, repair_budgets: AutonomyBudgetsConfig) -> (MissionContext, Arc<corestack_event_log::EventStore>) {
    let store = Arc::new(corestack_event_log::EventStore::open(workspace.storage_path().join("events.jsonl")).await.expect("open store"));
    let bus = Arc::new(corestack_event_log::EventBus::new(store.clone()));
    let fs: Arc<dyn FileSystemAdapter> = Arc::new(LocalFileSystem);
    let mode = Arc::new(ModeManager::new(bus.clone()));
    let approval = Arc::new(ApprovalManager::new(bus.clone()));
    let checkpoint = Arc::new(CheckpointManager::new(bus.clone(), fs.clone(), workspace.storage_path().join("checkpoints")));
    let snapshot = Arc::new(SnapshotManager::new(bus.clone(), fs.clone()));
    let diff = Arc::new(DiffManager::new(bus.clone(), fs.clone(), checkpoint.clone(), snapshot.clone(), workspace.workspace_path(), workspace.storage_path().join("evidence")));
    let autonomy = Arc::new(AutonomyController::new(bus.clone(), checkpoint.clone()));
    let policy = VerifyPolicyConfig {
        mode: verify_mode,
        fallback_commands: vec![command.to_string()],
        ..Default::default()
    };
    let verify = Arc::new(VerifyManager::new(bus.clone(), mode.clone(), fs.clone(), workspace.workspace_path(), workspace.storage_path().join("verify-evidence"), policy));

    let ctx = MissionContext {
        bus,
        mode,
        approval,
        checkpoint,
        snapshot,
        diff,
        autonomy,
        verify,
        model: None,
        fs,
        workspace_root: workspace.workspace_path(),
        repair_budgets,
    };
    (ctx, store)
}

fn request(task_id: &str, path: &std::path::Path, content: &str) -> MissionRequest {
    MissionRequest {
        task_id: task_id.to_string(),
        intent: "fix the failing widget".to_string(),
        plan_summary: "edit the widget file".to_string(),
        cited_files: vec![],
        edit: EditProposal {
            step_id: "step-1".to_string(),
            description: "update widget".to_string(),
            summary: "one file changed".to_string(),
            source_context: vec![],
            files: vec![DiffEntry {
                path: path.to_str().expect("utf8 path").to_string(),
                operation: DiffOperation::Create,
                new_content: Some(content.as_bytes().to_vec()),
                pre_change_hash: None,
            }],
            model_confidence: None,
        },
        run_id: "run-1".to_string(),
        verify_replay: false,
        verify_command_override: None,
    }
}

/// Approve every pending approval for `task_id` as soon as it appears.
async fn auto_approve(approval: Arc<ApprovalManager>, task_id: String) {
    tokio::spawn(async move {
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            let pending = approval.pending_requests().await;
            for request in pending.into_iter().filter(|r| r.task_id == task_id && r.status == corestack_approval::ApprovalStatus::Pending) {
                approval
                    .resolve_approval(&request.approval_id, ApprovalDecision::Approved, None, None, &task_id, Mode::Mission, Stage::Plan)
                    .await;
            }
        }
    });
}

#[tokio::test]
async fn mission_succeeds_when_plan_diff_and_verify_all_pass() {
    let workspace = TempWorkspace::new().expect("workspace");
    let (ctx, store) = new_context(&workspace, VerifyMode::Auto, "true", AutonomyBudgetsConfig::default()).await;
    let approval = ctx.approval.clone();
    auto_approve(approval, "task-1".to_string()).await;

    let runner = MissionRunner::new(ctx);
    let outcome = runner.run_mission(request("task-1", &workspace.workspace_path().join("widget.txt"), "hello")).await.expect("run_mission");

    assert!(outcome.success);
    assert_eq!(outcome.stop_reason, MissionStopReason::VerifyPassed);
    assert_eq!(outcome.terminal_stage, Stage::Done);
    assert!(workspace.workspace_path().join("widget.txt").exists());

    let events = store.get_by_task("task-1").await;
    assert!(events.iter().any(|e| e.payload.event_type() == EventType::MissionCompleted));
    assert!(events.iter().any(|e| e.payload.event_type() == EventType::DiffApplied));
}

#[tokio::test]
async fn mission_stops_when_plan_is_denied() {
    let workspace = TempWorkspace::new().expect("workspace");
    let (ctx, _store) = new_context(&workspace, VerifyMode::Auto, "true", AutonomyBudgetsConfig::default()).await;
    let approval = ctx.approval.clone();
    tokio::spawn({
        let approval = approval.clone();
        async move {
            for _ in 0..50 {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                let pending = approval.pending_requests().await;
                for request in pending.into_iter().filter(|r| r.task_id == "task-2" && r.status == corestack_approval::ApprovalStatus::Pending) {
                    approval
                        .resolve_approval(&request.approval_id, ApprovalDecision::Denied, None, None, "task-2", Mode::Mission, Stage::Plan)
                        .await;
                }
            }
        }
    });

    let runner = MissionRunner::new(ctx);
    let outcome = runner.run_mission(request("task-2", &workspace.workspace_path().join("widget.txt"), "hello")).await.expect("run_mission");

    assert!(!outcome.success);
    assert_eq!(outcome.stop_reason, MissionStopReason::PlanDenied);
    assert!(!workspace.workspace_path().join("widget.txt").exists());
}

#[tokio::test]
async fn repair_loop_exhausts_budget_when_verify_never_passes() {
    let workspace = TempWorkspace::new().expect("workspace");
    let budgets = AutonomyBudgetsConfig {
        max_iterations: 2,
        max_wall_time_secs: 60,
        max_tool_calls: 100,
    };
    let (ctx, store) = new_context(&workspace, VerifyMode::Auto, "false", budgets).await;
    let approval = ctx.approval.clone();
    auto_approve(approval, "task-3".to_string()).await;

    let runner = MissionRunner::new(ctx);
    let outcome = runner.run_mission(request("task-3", &workspace.workspace_path().join("widget.txt"), "hello")).await.expect("run_mission");

    assert!(!outcome.success);
    assert_eq!(outcome.stop_reason, MissionStopReason::RepairBudgetExhausted);
    assert!(outcome.repair_iterations >= 1);

    let events = store.get_by_task("task-3").await;
    assert!(events.iter().any(|e| e.payload.event_type() == EventType::BudgetExhausted));
}
