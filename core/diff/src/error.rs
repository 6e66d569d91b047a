//! Diff manager errors (spec.md §4.9, §7).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum DiffError {
    #[snafu(display("diff entry path {path} escapes the workspace"))]
    PathOutsideWorkspace {
        path: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("modify entry for {path} is missing its pre-change content hash"))]
    MissingPreChangeHash {
        path: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("create/modify entry for {path} is missing new content"))]
    MissingNewContent {
        path: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("proposal {diff_id} not found"))]
    ProposalNotFound {
        diff_id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("stale context detected for {path}: {reason}"))]
    StaleContext {
        path: String,
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to apply entry for {path}"))]
    ApplyEntryFailed {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to persist evidence at {path}"))]
    EvidencePersist {
        path: String,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to write evidence file at {path}"))]
    EvidenceWrite {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("checkpoint operation failed while applying a diff"))]
    Checkpoint {
        source: corestack_checkpoint::CheckpointError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for DiffError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::PathOutsideWorkspace { .. } => StatusCode::DiffPathOutsideWorkspace,
            Self::MissingPreChangeHash { .. } | Self::MissingNewContent { .. } | Self::ProposalNotFound { .. } => {
                StatusCode::InvalidDiffProposal
            }
            Self::StaleContext { .. } => StatusCode::StaleContext,
            Self::ApplyEntryFailed { .. } | Self::EvidencePersist { .. } | Self::EvidenceWrite { .. } | Self::Checkpoint { .. } => {
                StatusCode::DiffApplyFailed
            }
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, DiffError>;
