//! Verify-phase errors (spec.md §4.13, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum VerifyError {
    #[snafu(display("no verify commands could be discovered for task {task_id}"))]
    NoCommandsDiscovered {
        task_id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("policy filtering removed every discovered command for task {task_id}"))]
    AllCommandsFiltered {
        task_id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("stage transition to verify failed"))]
    StageTransition {
        source: corestack_mode::ModeError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to persist verify transcript at {path}"))]
    EvidencePersist {
        path: String,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to write verify transcript at {path}"))]
    EvidenceWrite {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for VerifyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoCommandsDiscovered { .. } => StatusCode::NoCommandsDiscovered,
            Self::AllCommandsFiltered { .. } => StatusCode::AllCommandsFiltered,
            Self::StageTransition { .. } => StatusCode::Internal,
            Self::EvidencePersist { .. } | Self::EvidenceWrite { .. } => StatusCode::IoError,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
