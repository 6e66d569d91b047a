//! Conversation history errors (spec.md §4.4, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ConversationError {
    #[snafu(display("failed to serialize conversation history: {source}"))]
    Serialize {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to deserialize conversation history: {source}"))]
    Deserialize {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for ConversationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Serialize { .. } | Self::Deserialize { .. } => StatusCode::InvalidArguments,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, ConversationError>;
