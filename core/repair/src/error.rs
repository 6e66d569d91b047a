//! Repair orchestrator errors (spec.md §4.14, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum RepairError {
    #[snafu(display("model transport error while diagnosing failure for task {task_id}: {message}"))]
    DiagnosisTransport {
        task_id: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("model transport error while proposing a fix for task {task_id}: {message}"))]
    FixTransport {
        task_id: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("proposing the repair diff failed"))]
    DiffProposal {
        source: corestack_diff::DiffError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for RepairError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::DiagnosisTransport { .. } => StatusCode::ProviderError,
            Self::FixTransport { .. } => StatusCode::ProviderError,
            Self::DiffProposal { .. } => StatusCode::RepairDiffTranslationFailed,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, RepairError>;
