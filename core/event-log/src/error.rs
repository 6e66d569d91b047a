//! Event store/bus errors (spec.md §4.1, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum EventLogError {
    /// Invariant E2: appending an event whose type is outside the
    /// canonical set fails deterministically. In this crate the type
    /// system already rules this out for in-process callers; this variant
    /// exists for the on-disk replay path, where a corrupt or
    /// forward-incompatible line can still carry an unrecognized tag.
    #[snafu(display("event {event_id} has an unrecognized type"))]
    UnknownType {
        event_id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to open event log at {path}"))]
    Open {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to append to event log at {path}"))]
    Append {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Invariant E3 requires the on-disk line to correspond to the event
    /// acknowledged as appended; a serialization failure must abort the
    /// append rather than write an empty line.
    #[snafu(display("failed to serialize event {event_id} for append"))]
    Serialize {
        event_id: String,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("event log at {path} has a corrupt line at offset {line_number}"))]
    Corrupt {
        path: String,
        line_number: usize,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for EventLogError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownType { .. } => StatusCode::UnknownEventType,
            Self::Open { .. } | Self::Append { .. } => StatusCode::AppendNotDurable,
            Self::Corrupt { .. } => StatusCode::EventLogCorrupt,
            Self::Serialize { .. } => StatusCode::EventSerializeFailed,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, EventLogError>;
