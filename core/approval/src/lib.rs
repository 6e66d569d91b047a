//! Human-in-the-loop approval gating (spec.md §4.7).

mod error;
mod manager;
mod types;

pub use error::ApprovalError;
pub use error::Result;
pub use manager::MAX_PENDING_REQUESTS;
pub use manager::ApprovalManager;
pub use manager::PendingApproval;
pub use types::ApprovalQueueStats;
pub use types::ApprovalRequest;
pub use types::ApprovalResolution;
pub use types::ApprovalStatus;
