//! Mode manager errors (spec.md §4.3, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ModeError {
    #[snafu(display("stage {attempted:?} is not reachable from {current:?} (spec.md §4.3)"))]
    InvalidStageTransition {
        current: corestack_protocol::Stage,
        attempted: corestack_protocol::Stage,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for ModeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidStageTransition { .. } => StatusCode::InvalidArguments,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, ModeError>;
