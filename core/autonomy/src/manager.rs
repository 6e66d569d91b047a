//! Bounded-autonomy controller A1 (spec.md §4.12).

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use corestack_checkpoint::CheckpointManager;
use corestack_event_log::EventBus;
use corestack_mode::AutonomyHalter;
use corestack_protocol::BudgetDimension;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::RestoreMethod;
use corestack_protocol::Stage;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::AutonomyError;
use crate::error::autonomy_error::InvalidStateSnafu;
use crate::error::autonomy_error::NotStartedSnafu;
use crate::error::autonomy_error::PreconditionFailedSnafu;
use crate::types::AutonomyBudgetsConfig;
use crate::types::AutonomyStatus;
use crate::types::BudgetsRemaining;
use crate::types::Preconditions;
use crate::types::Session;
use snafu::ResultExt;

/// Tracks one [`Session`] per task currently under autonomous execution.
pub struct AutonomyController {
    bus: Arc<EventBus>,
    checkpoint: Arc<CheckpointManager>,
    sessions: Mutex<HashMap<String, Session>>,
}

fn missing_preconditions(budgets: &AutonomyBudgetsConfig, preconditions: &Preconditions) -> Vec<String> {
    let mut missing = Vec::new();
    if !preconditions.mode_is_mission {
        missing.push("mode_is_mission".to_string());
    }
    if !preconditions.plan_approved {
        missing.push("plan_approved".to_string());
    }
    if !preconditions.tools_approved {
        missing.push("tools_approved".to_string());
    }
    if !preconditions.checkpoint_capability {
        missing.push("checkpoint_capability".to_string());
    }
    if budgets.max_iterations == 0 {
        missing.push("positive_iteration_budget".to_string());
    }
    missing
}

fn exceeded_budget(session: &Session) -> Option<BudgetDimension> {
    if session.iteration >= session.budgets.max_iterations {
        return Some(BudgetDimension::MaxIterations);
    }
    if session.elapsed_secs() >= session.budgets.max_wall_time_secs {
        return Some(BudgetDimension::MaxWallTime);
    }
    if session.tool_calls >= session.budgets.max_tool_calls {
        return Some(BudgetDimension::MaxToolCalls);
    }
    None
}

impl AutonomyController {
    pub fn new(bus: Arc<EventBus>, checkpoint: Arc<CheckpointManager>) -> Self {
        Self {
            bus,
            checkpoint,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn emit(&self, task_id: &str, mode: Mode, stage: Stage, payload: EventPayload) {
        if let Err(error) = self.bus.publish(Event::new(task_id, mode, stage, payload)).await {
            warn!(task_id, %error, "failed to persist autonomy event");
        }
    }

    /// Admit `task_id` into `running` if every precondition holds
    /// (spec.md §4.12). No state mutation on failure.
    pub async fn start(
        &self,
        task_id: &str,
        mode: Mode,
        stage: Stage,
        budgets: AutonomyBudgetsConfig,
        checkpoint_scope: Vec<PathBuf>,
        preconditions: Preconditions,
    ) -> Result<(), AutonomyError> {
        let missing = missing_preconditions(&budgets, &preconditions);
        if !missing.is_empty() {
            return PreconditionFailedSnafu {
                task_id: task_id.to_string(),
                missing,
            }
            .fail();
        }

        let mut session = Session::new(budgets, checkpoint_scope);
        session.status = AutonomyStatus::Running;
        session.started_at = Some(std::time::Instant::now());
        self.sessions.lock().await.insert(task_id.to_string(), session);

        self.emit(
            task_id,
            mode,
            stage,
            EventPayload::AutonomyStarted {
                max_iterations: budgets.max_iterations,
                max_wall_time_secs: budgets.max_wall_time_secs,
                max_tool_calls: budgets.max_tool_calls,
            },
        )
        .await;
        Ok(())
    }

    /// Run one bounded iteration (spec.md §4.12). Returns `false` when the
    /// caller should stop (not running, budget exhausted, or the callback
    /// succeeded); `true` when the callback failed and budgets still allow
    /// a retry.
    pub async fn execute_iteration<F, Fut>(&self, task_id: &str, mode: Mode, stage: Stage, callback: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let is_running = matches!(self.sessions.lock().await.get(task_id).map(|s| s.status), Some(AutonomyStatus::Running));
        if !is_running {
            return false;
        }

        if let Some(dimension) = self.mark_if_exhausted(task_id).await {
            self.emit(task_id, mode, stage, EventPayload::BudgetExhausted { exhausted_budget: dimension }).await;
            return false;
        }

        let (iteration, remaining, scope) = {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(task_id) else {
                return false;
            };
            session.iteration += 1;
            (session.iteration, session.remaining(), session.checkpoint_scope.clone())
        };

        if let Err(error) = self
            .checkpoint
            .create_checkpoint(task_id, mode, stage, format!("autonomy iteration {iteration}"), &scope, RestoreMethod::Snapshot)
            .await
        {
            warn!(task_id, iteration, %error, "mandatory pre-iteration checkpoint failed");
        }

        self.emit(
            task_id,
            mode,
            stage,
            EventPayload::IterationStarted {
                iteration,
                iterations_remaining: remaining.iterations_remaining,
                tool_calls_remaining: remaining.tool_calls_remaining,
            },
        )
        .await;

        match callback().await {
            Ok(()) => {
                self.emit(task_id, mode, stage, EventPayload::IterationSucceeded { iteration }).await;
                false
            }
            Err(reason) => {
                self.emit(task_id, mode, stage, EventPayload::IterationFailed { iteration, reason }).await;
                if let Some(dimension) = self.mark_if_exhausted(task_id).await {
                    self.emit(task_id, mode, stage, EventPayload::BudgetExhausted { exhausted_budget: dimension }).await;
                    false
                } else {
                    true
                }
            }
        }
    }

    async fn mark_if_exhausted(&self, task_id: &str) -> Option<BudgetDimension> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(task_id)?;
        let dimension = exceeded_budget(session)?;
        session.status = AutonomyStatus::BudgetExhausted;
        Some(dimension)
    }

    /// Emit `repair_attempted` then run `repair`, returning whatever it
    /// returns (spec.md §4.12).
    pub async fn attempt_repair<F, Fut, R>(
        &self,
        task_id: &str,
        mode: Mode,
        stage: Stage,
        diagnosis_source: impl Into<String>,
        failure_summary: impl Into<String>,
        repair: F,
    ) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        self.emit(
            task_id,
            mode,
            stage,
            EventPayload::RepairAttempted {
                diagnosis_source: diagnosis_source.into(),
                failure_summary: failure_summary.into(),
            },
        )
        .await;
        repair().await
    }

    pub async fn increment_tool_calls(&self, task_id: &str, n: u32) {
        if let Some(session) = self.sessions.lock().await.get_mut(task_id) {
            session.tool_calls += n;
        }
    }

    pub async fn get_budgets_remaining(&self, task_id: &str) -> Result<BudgetsRemaining, AutonomyError> {
        self.sessions
            .lock()
            .await
            .get(task_id)
            .map(Session::remaining)
            .context(NotStartedSnafu { task_id: task_id.to_string() })
    }

    pub async fn status(&self, task_id: &str) -> AutonomyStatus {
        self.sessions.lock().await.get(task_id).map(|s| s.status).unwrap_or(AutonomyStatus::Idle)
    }

    /// `running -> paused`, emitting `execution_paused`.
    pub async fn pause(&self, task_id: &str, mode: Mode, stage: Stage) -> Result<(), AutonomyError> {
        self.transition(task_id, AutonomyStatus::Running, AutonomyStatus::Paused).await?;
        self.emit(task_id, mode, stage, EventPayload::ExecutionPaused).await;
        Ok(())
    }

    /// `paused -> running`, emitting `execution_resumed`.
    pub async fn resume(&self, task_id: &str, mode: Mode, stage: Stage) -> Result<(), AutonomyError> {
        self.transition(task_id, AutonomyStatus::Paused, AutonomyStatus::Running).await?;
        self.emit(task_id, mode, stage, EventPayload::ExecutionResumed).await;
        Ok(())
    }

    /// `running | paused -> completed`, emitting `autonomy_completed`.
    pub async fn complete(&self, task_id: &str, mode: Mode, stage: Stage) -> Result<(), AutonomyError> {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(task_id) else {
            return NotStartedSnafu { task_id: task_id.to_string() }.fail();
        };
        if !matches!(session.status, AutonomyStatus::Running | AutonomyStatus::Paused) {
            return InvalidStateSnafu {
                task_id: task_id.to_string(),
                current: session.status,
            }
            .fail();
        }
        session.status = AutonomyStatus::Completed;
        drop(sessions);
        self.emit(task_id, mode, stage, EventPayload::AutonomyCompleted).await;
        Ok(())
    }

    /// Idempotent: halts from any state, emitting `autonomy_halted` only
    /// on the transition that actually changes state.
    pub async fn halt(&self, task_id: &str, mode: Mode, stage: Stage, reason: impl Into<String>) {
        let already_halted = {
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(task_id) {
                Some(session) if session.status == AutonomyStatus::Halted => true,
                Some(session) => {
                    session.status = AutonomyStatus::Halted;
                    false
                }
                None => return,
            }
        };
        if already_halted {
            return;
        }
        self.emit(task_id, mode, stage, EventPayload::AutonomyHalted { reason: reason.into() }).await;
    }

    async fn transition(&self, task_id: &str, from: AutonomyStatus, to: AutonomyStatus) -> Result<(), AutonomyError> {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(task_id) else {
            return NotStartedSnafu { task_id: task_id.to_string() }.fail();
        };
        if session.status != from {
            return InvalidStateSnafu {
                task_id: task_id.to_string(),
                current: session.status,
            }
            .fail();
        }
        session.status = to;
        Ok(())
    }
}

/// Registered with [`corestack_mode::ModeManager`] so a `MISSION ->
/// {ANSWER, PLAN}` transition halts any running autonomy session without
/// `corestack-mode` depending on this crate (spec.md §4.3, §4.12).
///
/// The trait method is synchronous; the actual halt runs on a spawned
/// task using `Mode::Mission`/`Stage::None` as the event's recorded
/// context, since by construction the task was running under `MISSION`
/// the instant before this fires.
impl AutonomyHalter for Arc<AutonomyController> {
    fn halt(&self, task_id: &str) {
        let controller = Arc::clone(self);
        let task_id = task_id.to_string();
        tokio::spawn(async move {
            AutonomyController::halt(&controller, &task_id, Mode::Mission, Stage::None, "mode changed away from mission").await;
        });
    }
}

#[cfg(test)]
#[path = "manager.test.rs"]
mod tests;
