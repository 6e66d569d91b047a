//! Approval manager errors (spec.md §4.7, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ApprovalError {
    #[snafu(display(
        "{pending} pending approvals already outstanding, cap is {cap} (SPEC_FULL §4 'Approval timeout')"
    ))]
    TooManyPending {
        pending: usize,
        cap: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("approval {approval_id} timed out waiting for resolution"))]
    TimedOut {
        approval_id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("approval {approval_id}'s resolution channel closed without a decision"))]
    ChannelClosed {
        approval_id: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for ApprovalError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::TooManyPending { .. } => StatusCode::ResourcesExhausted,
            Self::TimedOut { .. } => StatusCode::Timeout,
            Self::ChannelClosed { .. } => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, ApprovalError>;
