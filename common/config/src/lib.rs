//! JSONC configuration loading with environment-variable precedence
//! (SPEC_FULL §3.3).
//!
//! This crate owns the file-format and precedence *mechanism* only: CLI
//! argument parsing and the decision of which config path to load stay
//! with the external collaborator (spec.md §1 Non-goals).

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::apply_env_overrides;
pub use loader::load_from_file;
pub use loader::parse;
pub use types::AutonomyBudgetsConfig;
pub use types::CompactionConfig;
pub use types::ConversationConfig;
pub use types::CoreStackConfig;
pub use types::LoopConfig;
pub use types::VerifyMode;
pub use types::VerifyPolicyConfig;
