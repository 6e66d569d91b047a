//! Diff / proposed patch data model (spec.md §3 "Diff / proposed patch").

use chrono::DateTime;
use chrono::Utc;
use corestack_protocol::DiffOperation;
use serde::Deserialize;
use serde::Serialize;

/// One per-file entry in a proposed diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: String,
    pub operation: DiffOperation,
    /// Required for `create`/`modify`; absent for `delete`.
    pub new_content: Option<Vec<u8>>,
    /// Required for `modify`: the file's content hash at proposal time
    /// (invariant D1).
    pub pre_change_hash: Option<String>,
}

/// A proposed patch, persisted as raw diff + manifest at propose time
/// (spec.md §6 "Evidence storage layout").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedDiff {
    pub diff_id: String,
    pub step_id: String,
    pub description: String,
    pub summary: String,
    pub source_context: Vec<String>,
    pub files: Vec<DiffEntry>,
    pub requires_checkpoint: bool,
    pub checkpoint_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// `<diff_id>.manifest.json` (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffManifest {
    pub diff_id: String,
    pub step_id: String,
    pub description: String,
    pub summary: String,
    pub source_context: Vec<String>,
    pub validation_report: Vec<String>,
    pub stats: DiffStats,
    pub model_confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DiffStats {
    pub files_created: usize,
    pub files_modified: usize,
    pub files_deleted: usize,
}

/// One file's before/after hash recorded at apply time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileApplyRecord {
    pub path: String,
    pub before_hash: Option<String>,
    pub after_hash: Option<String>,
}

/// `<diff_id>.apply.json` (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRecord {
    pub diff_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub files: Vec<FileApplyRecord>,
    pub applied_at: DateTime<Utc>,
}
