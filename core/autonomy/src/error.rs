//! Autonomy controller errors (spec.md §4.12).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum AutonomyError {
    #[snafu(display("start preconditions unmet for task {task_id}: {}", missing.join(", ")))]
    PreconditionFailed {
        task_id: String,
        missing: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("task {task_id} is {current:?}, which does not permit this operation"))]
    InvalidState {
        task_id: String,
        current: crate::types::AutonomyStatus,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("no autonomy session is tracked for task {task_id}"))]
    NotStarted {
        task_id: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for AutonomyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::PreconditionFailed { .. } => StatusCode::AutonomyPreconditionFailed,
            Self::InvalidState { .. } | Self::NotStarted { .. } => StatusCode::AutonomyInvalidState,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, AutonomyError>;
