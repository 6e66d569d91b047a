//! Checkpoint data model (spec.md §3 "Checkpoint").

use chrono::DateTime;
use chrono::Utc;
use corestack_protocol::RestoreMethod;
use serde::Deserialize;
use serde::Serialize;

/// Checkpoint metadata, independent of the snapshot bytes themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub checkpoint_id: String,
    pub created_at: DateTime<Utc>,
    pub associated_event_id: Option<String>,
    pub restore_method: RestoreMethod,
    pub scope: Vec<String>,
    pub description: String,
}

/// One file's captured bytes at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub filepath: String,
    pub content: Vec<u8>,
}

/// On-disk layout of a single `<checkpoint_id>.json` (spec.md §6
/// "Checkpoint storage layout").
///
/// `scope` carries the full set of paths the checkpoint was taken over,
/// including paths that did not exist yet at snapshot time (e.g. a file a
/// diff is about to `create`). Restoring needs the full scope, not just
/// `files`, so it can delete anything a rollback must undo that has no
/// pre-existing content to restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointSnapshotFile {
    pub checkpoint_id: String,
    pub created_at: DateTime<Utc>,
    pub scope: Vec<String>,
    pub files: Vec<FileSnapshot>,
}

/// On-disk layout of `checkpoints.json`: the registry plus the single
/// active checkpoint id (open question in spec.md §9 resolved as
/// single-active; see DESIGN.md).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointRegistry {
    pub checkpoints: Vec<CheckpointMeta>,
    pub active_checkpoint_id: Option<String>,
}
