//! Mission runner request/result shapes (spec.md §4.15).

use corestack_diff::DiffEntry;
use corestack_protocol::Stage;
use corestack_verify::VerifyOutcome;

/// One file excerpt the retrieve stage should snapshot before edit.
#[derive(Debug, Clone)]
pub struct CitedFile {
    pub path: String,
    pub line_start: u32,
    pub line_end: u32,
}

/// The patch a mission's edit stage proposes, in the same shape the diff
/// manager expects (spec.md §4.9). Produced upstream by the agentic loop
/// and/or the intelligence layer — both external collaborators (spec.md
/// §1) — and handed to the mission runner as plain data.
#[derive(Debug, Clone)]
pub struct EditProposal {
    pub step_id: String,
    pub description: String,
    pub summary: String,
    pub source_context: Vec<String>,
    pub files: Vec<DiffEntry>,
    pub model_confidence: Option<f64>,
}

/// One end-to-end mission run's inputs (spec.md §4.15 "On entry with a
/// user intent string").
#[derive(Debug, Clone)]
pub struct MissionRequest {
    pub task_id: String,
    pub intent: String,
    pub plan_summary: String,
    pub cited_files: Vec<CitedFile>,
    pub edit: EditProposal,
    pub run_id: String,
    /// Threaded through to every `VerifyRequest` this mission issues
    /// (spec.md §4.13 step 1): crash recovery's `resume` path re-enters a
    /// mission without re-running verify against a workspace state that
    /// was already verified before the crash.
    pub verify_replay: bool,
    /// Threaded through to every `VerifyRequest` this mission issues
    /// (spec.md §4.13's "optional user-supplied command override"):
    /// bypasses command discovery in favor of this exact command.
    pub verify_command_override: Option<String>,
}

/// Why a mission stopped driving the repair loop forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStopReason {
    VerifyPassed,
    VerifySkipped,
    PlanDenied,
    DiffDenied,
    StaleContext,
    RepairBudgetExhausted,
}

/// The terminal outcome of one `MissionRunner::run_mission` call.
#[derive(Debug, Clone)]
pub struct MissionOutcome {
    pub success: bool,
    pub stop_reason: MissionStopReason,
    pub terminal_stage: Stage,
    pub repair_iterations: u32,
    pub final_verify: Option<VerifyOutcome>,
}
