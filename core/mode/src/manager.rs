//! `(mode, stage)` tracking per task (spec.md §4.3).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use corestack_event_log::EventBus;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::Stage;
use tokio::sync::Mutex;

use crate::error::ModeError;
use crate::error::mode_error::InvalidStageTransitionSnafu;

/// Registered by the autonomy controller so the mode manager can halt a
/// running autonomous mission without depending on `corestack-autonomy`
/// directly (that crate depends on this one, not the reverse).
pub trait AutonomyHalter: Send + Sync {
    fn halt(&self, task_id: &str);
}

#[derive(Debug, Clone, Copy)]
struct TaskModeState {
    mode: Mode,
    stage: Stage,
}

impl Default for TaskModeState {
    fn default() -> Self {
        Self {
            mode: Mode::Answer,
            stage: Stage::None,
        }
    }
}

/// Holds current `(mode, stage)` per task.
pub struct ModeManager {
    bus: Arc<EventBus>,
    tasks: Mutex<HashMap<String, TaskModeState>>,
    halter: StdMutex<Option<Arc<dyn AutonomyHalter>>>,
}

impl ModeManager {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            tasks: Mutex::new(HashMap::new()),
            halter: StdMutex::new(None),
        }
    }

    /// Register the autonomy controller's halt hook (spec.md §4.3: "autonomy
    /// controller is halted if running" on a MISSION -> {ANSWER, PLAN} move).
    ///
    /// Synchronous and cheap enough to call from a mission's synchronous
    /// construction path (`MissionRunner::new`) without making it async.
    pub fn set_autonomy_halter(&self, halter: Arc<dyn AutonomyHalter>) {
        *self.halter.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(halter);
    }

    pub async fn current(&self, task_id: &str) -> (Mode, Stage) {
        let tasks = self.tasks.lock().await;
        let state = tasks.get(task_id).copied().unwrap_or_default();
        (state.mode, state.stage)
    }

    /// Set `mode`, emitting `mode_set` with before/after. Same-mode is a
    /// no-op emitting nothing. MISSION -> {ANSWER, PLAN} halts a running
    /// autonomy controller for this task.
    pub async fn set_mode(&self, task_id: &str, mode: Mode) {
        let from = {
            let mut tasks = self.tasks.lock().await;
            let state = tasks.entry(task_id.to_string()).or_default();
            let from = state.mode;
            if from == mode {
                return;
            }
            state.mode = mode;
            from
        };

        if from == Mode::Mission && mode != Mode::Mission {
            let halter = self.halter.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone();
            if let Some(halter) = halter {
                halter.halt(task_id);
            }
        }

        let current_stage = self.current(task_id).await.1;
        let _ = self
            .bus
            .publish(Event::new(
                task_id,
                mode,
                current_stage,
                EventPayload::ModeSet { from, to: mode },
            ))
            .await;
    }

    /// Set `stage`, emitting `stage_changed` with before/after. Rejects
    /// jumps that violate the linear mission sequence `intent -> plan ->
    /// retrieve -> edit -> verify -> (repair -> edit)* -> done`; `done` is
    /// reachable from any stage (fatal error) and `intent` is always a
    /// valid reset.
    pub async fn set_stage(&self, task_id: &str, stage: Stage) -> Result<(), ModeError> {
        let current_mode = self.current(task_id).await.0;
        let from = {
            let mut tasks = self.tasks.lock().await;
            let state = tasks.entry(task_id.to_string()).or_default();
            let from = state.stage;
            if from == stage {
                return Ok(());
            }
            if !is_allowed_transition(from, stage) {
                return InvalidStageTransitionSnafu {
                    current: from,
                    attempted: stage,
                }
                .fail();
            }
            state.stage = stage;
            from
        };

        let _ = self
            .bus
            .publish(Event::new(
                task_id,
                current_mode,
                stage,
                EventPayload::StageChanged { from, to: stage },
            ))
            .await;
        Ok(())
    }
}

fn is_allowed_transition(from: Stage, to: Stage) -> bool {
    if to == Stage::Done || to == Stage::Intent {
        return true;
    }
    matches!(
        (from, to),
        (Stage::None, Stage::Intent)
            | (Stage::Intent, Stage::Plan)
            | (Stage::Plan, Stage::Retrieve)
            | (Stage::Retrieve, Stage::Edit)
            | (Stage::Edit, Stage::Verify)
            | (Stage::Verify, Stage::Repair)
            | (Stage::Repair, Stage::Edit)
    )
}

#[cfg(test)]
#[path = "manager.test.rs"]
mod tests;
