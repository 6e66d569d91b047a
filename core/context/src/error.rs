//! Context-fit and snapshot errors (spec.md §4.5, §4.10).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ContextError {
    #[snafu(display("failed to read {path} for context snapshot"))]
    FileRead {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("line range {start}..{end} is out of bounds for {path} ({len} lines)"))]
    LineRangeOutOfBounds {
        path: String,
        start: usize,
        end: usize,
        len: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("token counter failed: {message}"))]
    Counter {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for ContextError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::FileRead { .. } => StatusCode::Internal,
            Self::LineRangeOutOfBounds { .. } => StatusCode::InvalidArguments,
            Self::Counter { .. } => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, ContextError>;
