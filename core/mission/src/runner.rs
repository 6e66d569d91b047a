//! Mission Runner (spec.md §4.15): composes every manager into the
//! end-to-end mission stage machine
//! `intent -> plan -> retrieve -> edit -> verify -> (repair -> edit)* -> done`.
//!
//! Per the "module-level singletons" redesign flag (spec.md §9), every
//! manager this runner touches is threaded through explicitly as a
//! [`MissionContext`] handle constructed once per mission and dropped at
//! mission end — there is no global mutable state.

use std::sync::Arc;

use corestack_approval::ApprovalManager;
use corestack_autonomy::AutonomyController;
use corestack_checkpoint::CheckpointManager;
use corestack_config::AutonomyBudgetsConfig;
use corestack_context::SnapshotManager;
use corestack_diff::DiffManager;
use corestack_event_log::EventBus;
use corestack_mode::ModeManager;
use corestack_protocol::ApprovalDecision;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::Stage;
use corestack_repair::TestFailureRecord;
use corestack_repair::diagnose_failure;
use corestack_repair::propose_repair_fix;
use corestack_verify::VerifyManager;
use corestack_verify::VerifyOutcome;
use corestack_verify::VerifyRequest;
use snafu::ResultExt;
use tracing::info;
use tracing::warn;

use crate::error::AutonomyStartSnafu;
use crate::error::ApprovalSnafu;
use crate::error::DiffApplySnafu;
use crate::error::DiffProposeSnafu;
use crate::error::Result;
use crate::error::SnapshotSnafu;
use crate::error::StageTransitionSnafu;
use crate::error::VerifySnafu;
use crate::types::MissionOutcome;
use crate::types::MissionRequest;
use crate::types::MissionStopReason;

/// Every manager a mission touches, constructed once at mission start.
pub struct MissionContext {
    pub bus: Arc<EventBus>,
    pub mode: Arc<ModeManager>,
    pub approval: Arc<ApprovalManager>,
    #[allow(dead_code)]
    pub checkpoint: Arc<CheckpointManager>,
    pub snapshot: Arc<SnapshotManager>,
    pub diff: Arc<DiffManager>,
    pub autonomy: Arc<AutonomyController>,
    pub verify: Arc<VerifyManager>,
    pub model: Option<Arc<dyn corestack_protocol::ModelClient>>,
    pub fs: Arc<dyn corestack_protocol::FileSystemAdapter>,
    pub workspace_root: std::path::PathBuf,
    pub repair_budgets: AutonomyBudgetsConfig,
}

/// Drives one mission's stage machine end to end.
pub struct MissionRunner {
    ctx: MissionContext,
}

impl MissionRunner {
    /// Wires the mode manager's autonomy-halt hook to this context's
    /// controller (spec.md §4.3: leaving `MISSION` halts a running
    /// autonomy session) before handing back a runner. Callers that build
    /// a `MissionContext` by hand never need to remember this step.
    pub fn new(ctx: MissionContext) -> Self {
        let halter: Arc<dyn corestack_mode::AutonomyHalter> = Arc::new(ctx.autonomy.clone());
        ctx.mode.set_autonomy_halter(halter);
        Self { ctx }
    }

    async fn publish(&self, task_id: &str, payload: EventPayload) {
        let (mode, stage) = self.ctx.mode.current(task_id).await;
        let _ = self.ctx.bus.publish(Event::new(task_id, mode, stage, payload)).await;
    }

    async fn set_stage(&self, task_id: &str, stage: Stage) -> Result<()> {
        self.ctx.mode.set_stage(task_id, stage).await.with_context(|_| StageTransitionSnafu { task_id: task_id.to_string() })
    }

    /// Run one mission to completion (spec.md §4.15's stage sequence).
    pub async fn run_mission(&self, request: MissionRequest) -> Result<MissionOutcome> {
        let task_id = request.task_id.clone();

        self.ctx.mode.set_mode(&task_id, Mode::Mission).await;
        self.set_stage(&task_id, Stage::Intent).await?;
        self.publish(&task_id, EventPayload::IntentReceived { intent: request.intent.clone() }).await;

        self.set_stage(&task_id, Stage::Plan).await?;
        self.publish(&task_id, EventPayload::PlanProposed { summary: request.plan_summary.clone() }).await;

        let plan_approval = self
            .ctx
            .approval
            .request_approval(
                &task_id,
                Mode::Mission,
                Stage::Plan,
                "plan",
                request.plan_summary.clone(),
                serde_json::json!({ "summary": request.plan_summary }),
                None,
            )
            .await
            .with_context(|_| ApprovalSnafu { task_id: task_id.clone() })?;
        let approval_id = plan_approval.approval_id.clone();
        let resolution = plan_approval.wait().await.with_context(|_| ApprovalSnafu { task_id: task_id.clone() })?;

        if !resolution.is_approved() {
            return Ok(self.finish(&task_id, false, MissionStopReason::PlanDenied, Stage::Plan, 0, None).await);
        }
        self.publish(&task_id, EventPayload::PlanApproved { approval_id }).await;

        self.set_stage(&task_id, Stage::Retrieve).await?;
        let file_paths: Vec<String> = request.cited_files.iter().map(|f| f.path.clone()).collect();
        self.publish(&task_id, EventPayload::RetrieveStarted { file_paths }).await;
        for cited in &request.cited_files {
            self.ctx
                .snapshot
                .create_snapshot(&task_id, Mode::Mission, Stage::Retrieve, &cited.path, cited.line_start, cited.line_end)
                .await
                .with_context(|_| SnapshotSnafu {
                    task_id: task_id.clone(),
                    path: cited.path.clone(),
                })?;
        }

        match self.edit_and_verify(&task_id, &request).await? {
            EditVerifyOutcome::Done(outcome) => return Ok(outcome),
            EditVerifyOutcome::Failed(failure) => {
                return Ok(self.repair_loop(&task_id, &request, failure).await?);
            }
        }
    }

    /// One pass of propose -> approve -> apply -> verify. Returns either a
    /// terminal outcome (denied / stale context / verify passed or
    /// skipped) or a test-failure record for the repair loop to diagnose.
    async fn edit_and_verify(&self, task_id: &str, request: &MissionRequest) -> Result<EditVerifyOutcome> {
        self.set_stage(task_id, Stage::Edit).await?;

        let diff_id = self
            .ctx
            .diff
            .propose_diff(
                task_id,
                Mode::Mission,
                Stage::Edit,
                request.edit.step_id.clone(),
                request.edit.description.clone(),
                request.edit.summary.clone(),
                request.edit.source_context.clone(),
                request.edit.files.clone(),
                true,
                request.edit.model_confidence,
            )
            .await
            .with_context(|_| DiffProposeSnafu { task_id: task_id.to_string() })?;

        let diff_approval = self
            .ctx
            .approval
            .request_approval(
                task_id,
                Mode::Mission,
                Stage::Edit,
                "diff",
                request.edit.description.clone(),
                serde_json::json!({ "diff_id": diff_id, "summary": request.edit.summary }),
                None,
            )
            .await
            .with_context(|_| ApprovalSnafu { task_id: task_id.to_string() })?;
        let resolution = diff_approval.wait().await.with_context(|_| ApprovalSnafu { task_id: task_id.to_string() })?;

        if !resolution.is_approved() {
            self.ctx.diff.reject_diff(&diff_id, "plan approver declined the proposed diff", task_id, Mode::Mission, Stage::Edit).await;
            return Ok(EditVerifyOutcome::Done(self.finish(task_id, false, MissionStopReason::DiffDenied, Stage::Edit, 0, None).await));
        }

        if let Err(error) = self.ctx.diff.apply_diff(&diff_id, task_id, Mode::Mission, Stage::Edit).await {
            warn!(task_id, %error, "diff apply failed, likely stale context");
            return Ok(EditVerifyOutcome::Done(self.finish(task_id, false, MissionStopReason::StaleContext, Stage::Edit, 0, None).await));
        }

        let outcome = self.verify_now(task_id, request, 0).await?;
        Ok(match outcome.status {
            corestack_protocol::VerifyStatus::Pass => {
                EditVerifyOutcome::Done(self.finish(task_id, true, MissionStopReason::VerifyPassed, Stage::Verify, 0, Some(outcome)).await)
            }
            corestack_protocol::VerifyStatus::Skipped => {
                EditVerifyOutcome::Done(self.finish(task_id, true, MissionStopReason::VerifySkipped, Stage::Verify, 0, Some(outcome)).await)
            }
            corestack_protocol::VerifyStatus::Fail => EditVerifyOutcome::Failed(outcome),
        })
    }

    /// Run the shared verify-phase call for one `(run_id, step)` pair.
    async fn verify_now(&self, task_id: &str, request: &MissionRequest, step: u32) -> Result<VerifyOutcome> {
        self.ctx
            .verify
            .run_verify(VerifyRequest {
                task_id,
                mode: Mode::Mission,
                run_id: &request.run_id,
                mission_id: &request.run_id,
                step_id: &format!("{}-{step}", request.edit.step_id),
                replay: request.verify_replay,
                command_override: request.verify_command_override.clone(),
            })
            .await
            .with_context(|_| VerifySnafu { task_id: task_id.to_string() })
    }

    /// Bounded repair iteration (spec.md §4.12, §4.14): diagnose, propose
    /// a fix, apply it, and re-verify, until verify passes or the
    /// autonomy controller's budget is exhausted.
    async fn repair_loop(&self, task_id: &str, request: &MissionRequest, mut failure: VerifyOutcome) -> Result<MissionOutcome> {
        self.set_stage(task_id, Stage::Repair).await?;

        let checkpoint_scope: Vec<std::path::PathBuf> = request.edit.files.iter().map(|f| std::path::PathBuf::from(&f.path)).collect();
        let preconditions = corestack_autonomy::Preconditions {
            mode_is_mission: true,
            plan_approved: true,
            tools_approved: true,
            checkpoint_capability: true,
        };
        self.ctx
            .autonomy
            .start(task_id, Mode::Mission, Stage::Repair, self.ctx.repair_budgets, checkpoint_scope, preconditions)
            .await
            .with_context(|_| AutonomyStartSnafu { task_id: task_id.to_string() })?;

        let mut iteration: u32 = 0;
        let mut last_pass: Option<VerifyOutcome> = None;
        loop {
            let test_failure = TestFailureRecord {
                command: failure.failed_command.clone().unwrap_or_else(|| "unknown".to_string()),
                exit_code: failure.exit_code,
                stdout: String::new(),
                stderr: failure.reason.clone().unwrap_or_default(),
                summary: format!("verify failed: {:?}", failure.failed_command),
            };

            let round = std::cell::RefCell::new(Err::<VerifyOutcome, String>("repair iteration did not run".to_string()));
            let should_retry = self
                .ctx
                .autonomy
                .execute_iteration(task_id, Mode::Mission, Stage::Repair, || async {
                    let diagnosis = diagnose_failure(self.ctx.model.as_ref(), &test_failure).await.map_err(|e| e.to_string())?;
                    let diagnosis_source = diagnosis.source.as_str().to_string();
                    let failure_summary = diagnosis.failure_summary.clone();

                    let result = self
                        .ctx
                        .autonomy
                        .attempt_repair(task_id, Mode::Mission, Stage::Repair, diagnosis_source, failure_summary, || async {
                            let proposal = propose_repair_fix(
                                self.ctx.model.as_ref(),
                                self.ctx.fs.as_ref(),
                                &self.ctx.diff,
                                &self.ctx.workspace_root,
                                &diagnosis,
                                task_id,
                                Mode::Mission,
                                Stage::Repair,
                                format!("{}-repair-{iteration}", request.edit.step_id),
                            )
                            .await
                            .map_err(|e| e.to_string())?;

                            self.ctx
                                .diff
                                .apply_diff(&proposal.diff_id, task_id, Mode::Mission, Stage::Repair)
                                .await
                                .map_err(|e| e.to_string())?;

                            self.verify_now(task_id, request, iteration + 1).await.map_err(|e| e.to_string())
                        })
                        .await?;

                    match result.status {
                        corestack_protocol::VerifyStatus::Pass | corestack_protocol::VerifyStatus::Skipped => {
                            *round.borrow_mut() = Ok(result);
                            Ok(())
                        }
                        corestack_protocol::VerifyStatus::Fail => {
                            let reason = format!("verify still failing: {:?}", result.failed_command);
                            *round.borrow_mut() = Ok(result);
                            Err(reason)
                        }
                    }
                })
                .await;

            iteration += 1;
            if let Ok(outcome) = round.into_inner() {
                let passed = matches!(outcome.status, corestack_protocol::VerifyStatus::Pass | corestack_protocol::VerifyStatus::Skipped);
                if passed {
                    last_pass = Some(outcome);
                    break;
                }
                failure = outcome;
            }

            if !should_retry {
                break;
            }
        }

        let success = last_pass.is_some();
        let stop_reason = if success { MissionStopReason::VerifyPassed } else { MissionStopReason::RepairBudgetExhausted };
        Ok(self.finish(task_id, success, stop_reason, Stage::Repair, iteration, last_pass.or(Some(failure))).await)
    }

    async fn finish(&self, task_id: &str, success: bool, stop_reason: MissionStopReason, terminal_stage: Stage, repair_iterations: u32, final_verify: Option<VerifyOutcome>) -> MissionOutcome {
        self.publish(task_id, EventPayload::MissionCompleted { success }).await;
        if self.set_stage(task_id, Stage::Done).await.is_err() {
            warn!(task_id, "stage transition to done failed after mission completion");
        }
        info!(task_id, success, ?stop_reason, "mission finished");
        MissionOutcome {
            success,
            stop_reason,
            terminal_stage,
            repair_iterations,
            final_verify,
        }
    }
}

enum EditVerifyOutcome {
    Done(MissionOutcome),
    Failed(VerifyOutcome),
}
