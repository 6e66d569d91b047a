//! Bounded-autonomy controller A1 (spec.md §4.12): admits a task into an
//! iteration loop bounded by iteration count, wall time, and tool-call
//! count, checkpointing before every iteration body and halting
//! automatically when the task's mode leaves `MISSION`.

mod error;
mod manager;
mod types;

pub use error::AutonomyError;
pub use error::Result;
pub use manager::AutonomyController;
pub use types::AutonomyBudgetsConfig;
pub use types::AutonomyStatus;
pub use types::BudgetsRemaining;
pub use types::Preconditions;
