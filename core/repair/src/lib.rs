//! Repair Orchestrator (spec.md §4.14): diagnoses a verify failure and
//! proposes a fix, entering it into the diff manager's standard
//! propose-approval-apply path. Composed by the mission runner inside an
//! autonomy-bounded repair iteration; this crate holds no mutable session
//! state of its own.

mod diagnose;
mod error;
mod fix;
mod types;

pub use diagnose::diagnose_failure;
pub use error::RepairError;
pub use error::Result;
pub use fix::propose_repair_fix;
pub use types::Diagnosis;
pub use types::DiagnosisResponse;
pub use types::DiagnosisSource;
pub use types::FixProposalResponse;
pub use types::FixSource;
pub use types::RepairFixProposal;
pub use types::TestFailureRecord;
pub use types::TouchedFile;
