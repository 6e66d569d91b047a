//! Shared test fixtures: fake model client, fake tool provider, temp
//! workspace + event bus helpers. Used as a `dev-dependency` by the
//! higher-layer crates (loop, autonomy, verify, repair, mission) whose
//! tests all need the same scaffolding.

pub mod model_client;
pub mod tool_provider;
pub mod workspace;

pub use model_client::ScriptedModelClient;
pub use tool_provider::CannedToolProvider;
pub use workspace::TempWorkspace;
pub use workspace::new_event_bus;
