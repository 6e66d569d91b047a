//! Approval request data model (spec.md §3 "Approval request").

use corestack_protocol::ApprovalDecision;
use corestack_protocol::ApprovalScope;
use corestack_protocol::Mode;
use corestack_protocol::Stage;
use serde::Serialize;

/// Current status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
    EditRequested,
}

impl From<ApprovalDecision> for ApprovalStatus {
    fn from(decision: ApprovalDecision) -> Self {
        match decision {
            ApprovalDecision::Approved => Self::Approved,
            ApprovalDecision::Denied => Self::Denied,
            ApprovalDecision::EditRequested => Self::EditRequested,
        }
    }
}

/// A parked approval request, as exposed by introspection methods.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalRequest {
    pub approval_id: String,
    pub task_id: String,
    pub mode: Mode,
    pub stage: Stage,
    pub approval_type: String,
    pub description: String,
    pub details: serde_json::Value,
    pub status: ApprovalStatus,
    pub scope: Option<ApprovalScope>,
    pub modified_details: Option<serde_json::Value>,
}

/// The outcome handed to the original `request_approval` caller once
/// resolved.
#[derive(Debug, Clone)]
pub struct ApprovalResolution {
    pub decision: ApprovalDecision,
    pub scope: Option<ApprovalScope>,
    pub modified_details: Option<serde_json::Value>,
}

impl ApprovalResolution {
    pub fn is_approved(&self) -> bool {
        matches!(self.decision, ApprovalDecision::Approved)
    }
}

/// Aggregate counts, mirroring the teacher's `PermissionQueueStats`
/// (SPEC_FULL §4 "Approval/permission queue introspection").
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ApprovalQueueStats {
    pub pending: usize,
    pub approved: usize,
    pub denied: usize,
    pub edit_requested: usize,
}
