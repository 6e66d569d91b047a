//! Temp-directory and event-bus fixtures shared across integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use corestack_event_log::EventBus;
use corestack_event_log::EventStore;

/// A throwaway workspace directory plus a storage directory for
/// checkpoints/evidence, both cleaned up on drop.
pub struct TempWorkspace {
    pub workspace: tempfile::TempDir,
    pub storage: tempfile::TempDir,
}

impl TempWorkspace {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            workspace: tempfile::tempdir()?,
            storage: tempfile::tempdir()?,
        })
    }

    pub fn workspace_path(&self) -> PathBuf {
        self.workspace.path().to_path_buf()
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage.path().to_path_buf()
    }
}

/// Open a fresh event log under `storage_dir` and wrap it in a bus.
pub async fn new_event_bus(storage_dir: &std::path::Path) -> Arc<EventBus> {
    let store = EventStore::open(storage_dir.join("events.jsonl"))
        .await
        .unwrap_or_else(|e| panic!("failed to open test event log: {e}"));
    Arc::new(EventBus::new(Arc::new(store)))
}
