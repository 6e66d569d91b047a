//! Mission Runner & Crash Recovery (spec.md §4.15): the top-level
//! orchestrator that composes the event log, checkpoint, approval, mode,
//! context-snapshot, diff, autonomy, and verify managers into the
//! end-to-end mission stage machine, plus the startup-time crash
//! recovery analyzer that classifies interrupted tasks.

mod error;
mod recovery;
mod runner;
mod types;

pub use error::MissionError;
pub use error::Result;
pub use recovery::RecoveryRecommendation;
pub use recovery::TaskRecoveryAnalysis;
pub use recovery::analyze_tasks;
pub use recovery::recommend;
pub use runner::MissionContext;
pub use runner::MissionRunner;
pub use types::CitedFile;
pub use types::EditProposal;
pub use types::MissionOutcome;
pub use types::MissionRequest;
pub use types::MissionStopReason;
