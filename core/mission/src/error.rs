//! Mission runner errors (spec.md §4.15, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum MissionError {
    #[snafu(display("stage transition failed for task {task_id}"))]
    StageTransition {
        task_id: String,
        source: corestack_mode::ModeError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("approval request failed for task {task_id}"))]
    Approval {
        task_id: String,
        source: corestack_approval::ApprovalError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("context snapshot failed for {path} on task {task_id}"))]
    Snapshot {
        task_id: String,
        path: String,
        source: corestack_context::ContextError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("proposing the edit diff failed for task {task_id}"))]
    DiffPropose {
        task_id: String,
        source: corestack_diff::DiffError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("applying the edit diff failed for task {task_id}"))]
    DiffApply {
        task_id: String,
        source: corestack_diff::DiffError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("verify failed to run for task {task_id}"))]
    Verify {
        task_id: String,
        source: corestack_verify::VerifyError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("admitting task {task_id} into autonomy-bounded repair failed"))]
    AutonomyStart {
        task_id: String,
        source: corestack_autonomy::AutonomyError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for MissionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::StageTransition { .. } => StatusCode::Internal,
            Self::Approval { .. } => StatusCode::ManagerFailed,
            Self::Snapshot { .. } => StatusCode::ManagerFailed,
            Self::DiffPropose { .. } | Self::DiffApply { .. } => StatusCode::ManagerFailed,
            Self::Verify { .. } => StatusCode::ManagerFailed,
            Self::AutonomyStart { .. } => StatusCode::AutonomyPreconditionFailed,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, MissionError>;
