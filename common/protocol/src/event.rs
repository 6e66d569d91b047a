//! The append-only event envelope (spec.md §3, §6).
//!
//! `payload` is a tagged enum keyed by the event's canonical type, per the
//! redesign flag in spec.md §9: the source's untyped JSON map becomes a
//! closed Rust enum here, so appending an event whose `type` is not in the
//! canonical set is a deserialization error rather than a silent pass.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use strum::AsRefStr;
use strum::Display;
use strum::EnumString;

/// Top-level execution mode (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Answer,
    Plan,
    Mission,
}

/// Mission stage (spec.md §3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Intent,
    Plan,
    Retrieve,
    Edit,
    Verify,
    Repair,
    Done,
    None,
}

/// The closed enumeration of appendable event types (spec.md §6).
///
/// `EventPayload`'s serde tag reuses these exact string values, so
/// `EventType::from(&payload)` and the wire `"type"` field are always in
/// lock-step; there is no second field to drift out of sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    IntentReceived,
    ModeSet,
    StageChanged,
    PlanProposed,
    PlanApproved,
    RetrieveStarted,
    ContextSnapshotCreated,
    StaleContextDetected,
    DiffProposed,
    DiffApplied,
    DiffRejected,
    ApprovalRequested,
    ApprovalResolved,
    CheckpointCreated,
    CheckpointRestored,
    ToolStart,
    ToolEnd,
    StreamDelta,
    StreamComplete,
    ModelFallbackUsed,
    VerifyStarted,
    VerifyProposed,
    VerifyCompleted,
    VerifySkipped,
    RepairAttempted,
    IterationStarted,
    IterationSucceeded,
    IterationFailed,
    BudgetExhausted,
    AutonomyStarted,
    AutonomyCompleted,
    AutonomyHalted,
    ExecutionPaused,
    ExecutionResumed,
    MissionCompleted,
    DecisionPointNeeded,
    TestCompleted,
}

/// Approval decision (spec.md §3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Denied,
    EditRequested,
}

/// Approval scope (spec.md §3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalScope {
    Once,
    Always,
}

/// Result classification of the verify/command phase (spec.md §4.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    Pass,
    Fail,
    Skipped,
}

/// Checkpoint restore method (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreMethod {
    Snapshot,
    Git,
}

/// Diff entry operation (spec.md §3, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOperation {
    Create,
    Modify,
    Delete,
}

/// One autonomy budget dimension (spec.md §4.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BudgetDimension {
    MaxIterations,
    MaxWallTime,
    MaxToolCalls,
}

/// Type-specific payload for one event. The `#[serde(tag = "type")]`
/// discriminant is the wire value of [`EventType`]; an unrecognized tag, or
/// a recognized tag whose fields don't match, fails to deserialize rather
/// than silently passing through as an untyped map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    IntentReceived { intent: String },
    ModeSet { from: Mode, to: Mode },
    StageChanged { from: Stage, to: Stage },
    PlanProposed { summary: String },
    PlanApproved { approval_id: String },
    RetrieveStarted { file_paths: Vec<String> },
    ContextSnapshotCreated {
        file_path: String,
        line_start: u32,
        line_end: u32,
        content_hash: String,
    },
    StaleContextDetected { file_path: String, reason: String },
    DiffProposed {
        diff_id: String,
        step_id: String,
        file_count: usize,
        summary: String,
    },
    DiffApplied { diff_id: String, files: Vec<String> },
    DiffRejected { diff_id: String, reason: String },
    ApprovalRequested {
        approval_id: String,
        approval_type: String,
        description: String,
    },
    ApprovalResolved {
        approval_id: String,
        decision: ApprovalDecision,
        scope: Option<ApprovalScope>,
    },
    CheckpointCreated {
        checkpoint_id: String,
        scope: Vec<String>,
        description: String,
    },
    CheckpointRestored { checkpoint_id: String },
    ToolStart {
        tool_use_id: String,
        tool_name: String,
        sanitized_input: serde_json::Value,
    },
    ToolEnd {
        tool_use_id: String,
        success: bool,
        output_len: usize,
    },
    StreamDelta { text: String },
    StreamComplete { total_len: usize },
    ModelFallbackUsed { requested: String, resolved: String },
    VerifyStarted { commands: Vec<String> },
    VerifyProposed { commands: Vec<String> },
    VerifyCompleted {
        status: VerifyStatus,
        failed_command: Option<String>,
        exit_code: Option<i32>,
        transcript_evidence_id: Option<String>,
    },
    VerifySkipped { reason: String },
    RepairAttempted { diagnosis_source: String, failure_summary: String },
    IterationStarted {
        iteration: u32,
        iterations_remaining: u32,
        tool_calls_remaining: u32,
    },
    IterationSucceeded { iteration: u32 },
    IterationFailed { iteration: u32, reason: String },
    BudgetExhausted { exhausted_budget: BudgetDimension },
    AutonomyStarted {
        max_iterations: u32,
        max_wall_time_secs: u64,
        max_tool_calls: u32,
    },
    AutonomyCompleted,
    AutonomyHalted { reason: String },
    ExecutionPaused,
    ExecutionResumed,
    MissionCompleted { success: bool },
    DecisionPointNeeded { question: String, options: Vec<String> },
    TestCompleted { command: String, exit_code: i32 },
}

impl EventPayload {
    /// The canonical [`EventType`] this payload was tagged with.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::IntentReceived { .. } => EventType::IntentReceived,
            Self::ModeSet { .. } => EventType::ModeSet,
            Self::StageChanged { .. } => EventType::StageChanged,
            Self::PlanProposed { .. } => EventType::PlanProposed,
            Self::PlanApproved { .. } => EventType::PlanApproved,
            Self::RetrieveStarted { .. } => EventType::RetrieveStarted,
            Self::ContextSnapshotCreated { .. } => EventType::ContextSnapshotCreated,
            Self::StaleContextDetected { .. } => EventType::StaleContextDetected,
            Self::DiffProposed { .. } => EventType::DiffProposed,
            Self::DiffApplied { .. } => EventType::DiffApplied,
            Self::DiffRejected { .. } => EventType::DiffRejected,
            Self::ApprovalRequested { .. } => EventType::ApprovalRequested,
            Self::ApprovalResolved { .. } => EventType::ApprovalResolved,
            Self::CheckpointCreated { .. } => EventType::CheckpointCreated,
            Self::CheckpointRestored { .. } => EventType::CheckpointRestored,
            Self::ToolStart { .. } => EventType::ToolStart,
            Self::ToolEnd { .. } => EventType::ToolEnd,
            Self::StreamDelta { .. } => EventType::StreamDelta,
            Self::StreamComplete { .. } => EventType::StreamComplete,
            Self::ModelFallbackUsed { .. } => EventType::ModelFallbackUsed,
            Self::VerifyStarted { .. } => EventType::VerifyStarted,
            Self::VerifyProposed { .. } => EventType::VerifyProposed,
            Self::VerifyCompleted { .. } => EventType::VerifyCompleted,
            Self::VerifySkipped { .. } => EventType::VerifySkipped,
            Self::RepairAttempted { .. } => EventType::RepairAttempted,
            Self::IterationStarted { .. } => EventType::IterationStarted,
            Self::IterationSucceeded { .. } => EventType::IterationSucceeded,
            Self::IterationFailed { .. } => EventType::IterationFailed,
            Self::BudgetExhausted { .. } => EventType::BudgetExhausted,
            Self::AutonomyStarted { .. } => EventType::AutonomyStarted,
            Self::AutonomyCompleted => EventType::AutonomyCompleted,
            Self::AutonomyHalted { .. } => EventType::AutonomyHalted,
            Self::ExecutionPaused => EventType::ExecutionPaused,
            Self::ExecutionResumed => EventType::ExecutionResumed,
            Self::MissionCompleted { .. } => EventType::MissionCompleted,
            Self::DecisionPointNeeded { .. } => EventType::DecisionPointNeeded,
            Self::TestCompleted { .. } => EventType::TestCompleted,
        }
    }

    /// True for the four terminal-mission payloads that mark a task as
    /// cleanly exited (spec.md §3, §4.15).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::MissionCompleted { .. } | Self::AutonomyCompleted | Self::AutonomyHalted { .. } | Self::BudgetExhausted { .. }
        )
    }
}

/// One immutable record of causal history (spec.md §3).
///
/// Invariant E1 (append-only): nothing in this crate exposes a way to
/// mutate a constructed `Event`'s fields; the event store only ever returns
/// owned clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
    pub stage: Stage,
    pub payload: EventPayload,
    #[serde(default)]
    pub evidence_ids: Vec<String>,
    #[serde(default)]
    pub parent_event_id: Option<String>,
}

impl Event {
    /// Build a new event with a fresh `event_id` and `timestamp = now`.
    pub fn new(
        task_id: impl Into<String>,
        mode: Mode,
        stage: Stage,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            timestamp: Utc::now(),
            mode,
            stage,
            payload,
            evidence_ids: Vec::new(),
            parent_event_id: None,
        }
    }

    /// Attach evidence artifact ids (builder-style).
    #[must_use]
    pub fn with_evidence(mut self, ids: Vec<String>) -> Self {
        self.evidence_ids = ids;
        self
    }

    /// Attach the causal predecessor (builder-style).
    #[must_use]
    pub fn with_parent(mut self, parent_event_id: impl Into<String>) -> Self {
        self.parent_event_id = Some(parent_event_id.into());
        self
    }

    /// The canonical type tag, derived from the payload.
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}

#[cfg(test)]
#[path = "event.test.rs"]
mod tests;
