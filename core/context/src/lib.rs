//! Token Counter / Context Fit and the Context Snapshot Manager
//! (spec.md §4.5, §4.10).

mod counter;
mod error;
mod snapshot;
mod window_registry;

pub use counter::CharCountTokenCounter;
pub use error::ContextError;
pub use error::Result;
pub use snapshot::Snapshot;
pub use snapshot::SnapshotManager;
pub use snapshot::Staleness;
pub use window_registry::ContextFit;
pub use window_registry::validate_context_fits;
pub use window_registry::validate_context_fits_sync;
