//! Checkpoint manager errors (spec.md §4.8, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum CheckpointError {
    #[snafu(display("checkpoint {checkpoint_id} not found"))]
    NotFound {
        checkpoint_id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to read {path} while creating a checkpoint"))]
    Read {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to write {path} while restoring checkpoint {checkpoint_id}"))]
    Restore {
        checkpoint_id: String,
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to persist checkpoint metadata at {path}"))]
    Persist {
        path: String,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to read checkpoint registry/snapshot at {path}"))]
    Load {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to parse checkpoint data at {path}"))]
    Parse {
        path: String,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("the git restore method is not implemented in V1"))]
    GitMethodUnsupported {
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for CheckpointError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::CheckpointNotFound,
            Self::Read { .. } | Self::Restore { .. } => StatusCode::CheckpointRestoreFailed,
            Self::Persist { .. } | Self::Load { .. } | Self::Parse { .. } => {
                StatusCode::CheckpointRestoreFailed
            }
            Self::GitMethodUnsupported { .. } => StatusCode::CheckpointMethodUnsupported,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, CheckpointError>;
