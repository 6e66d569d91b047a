//! Context Snapshot Manager (spec.md §4.10): hash+mtime tracking of
//! retrieved file excerpts, and a staleness check run before a diff applies.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use corestack_event_log::EventBus;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::FileSystemAdapter;
use corestack_protocol::Mode;
use corestack_protocol::Stage;
use sha2::Digest;
use sha2::Sha256;
use snafu::ResultExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ContextError;
use crate::error::context_error::FileReadSnafu;
use crate::error::context_error::LineRangeOutOfBoundsSnafu;

#[derive(Debug, Clone)]
struct TrackedSnapshot {
    line_start: u32,
    line_end: u32,
    content_hash: String,
    mtime: SystemTime,
}

/// A retrieved-excerpt snapshot: path, the line range it covers, and its
/// content hash at snapshot time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    pub content_hash: String,
}

/// The staleness verdict for one tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Stale { reason: String },
}

fn hash_lines(lines: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(lines.join("\n").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Tracks snapshots of retrieved excerpts and detects edits made to the
/// underlying files after retrieval (spec.md §4.10, invariant P7).
pub struct SnapshotManager {
    bus: Arc<EventBus>,
    fs: Arc<dyn FileSystemAdapter>,
    tracked: Mutex<HashMap<String, TrackedSnapshot>>,
}

impl SnapshotManager {
    pub fn new(bus: Arc<EventBus>, fs: Arc<dyn FileSystemAdapter>) -> Self {
        Self {
            bus,
            fs,
            tracked: Mutex::new(HashMap::new()),
        }
    }

    /// Read `file_path`, slice `[line_start, line_end)`, hash the slice, and
    /// record the file's current mtime. Emits `context_snapshot_created`.
    pub async fn create_snapshot(
        &self,
        task_id: &str,
        mode: Mode,
        stage: Stage,
        file_path: &str,
        line_start: u32,
        line_end: u32,
    ) -> Result<Snapshot, ContextError> {
        let path = PathBuf::from(file_path);
        let bytes = self.fs.read_file(&path).await.context(FileReadSnafu {
            path: file_path.to_string(),
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let all_lines: Vec<&str> = content.lines().collect();
        let start = line_start as usize;
        let end = line_end as usize;
        if start > end || end > all_lines.len() {
            return LineRangeOutOfBoundsSnafu {
                path: file_path.to_string(),
                start,
                end,
                len: all_lines.len(),
            }
            .fail();
        }
        let content_hash = hash_lines(&all_lines[start..end]);
        let mtime = self.fs.metadata_mtime(&path).await.context(FileReadSnafu {
            path: file_path.to_string(),
        })?;

        self.tracked.lock().await.insert(
            file_path.to_string(),
            TrackedSnapshot {
                line_start,
                line_end,
                content_hash: content_hash.clone(),
                mtime,
            },
        );

        self.bus
            .publish(Event::new(
                task_id,
                mode,
                stage,
                EventPayload::ContextSnapshotCreated {
                    file_path: file_path.to_string(),
                    line_start,
                    line_end,
                    content_hash: content_hash.clone(),
                },
            ))
            .await
            .ok();

        Ok(Snapshot {
            file_path: file_path.to_string(),
            line_start,
            line_end,
            content_hash,
        })
    }

    /// Check tracked files (or only `paths`, if given) for staleness:
    /// mtime first, then content hash of the recorded range if mtime
    /// changed. A deleted file is always stale.
    pub async fn check_staleness(
        &self,
        task_id: &str,
        mode: Mode,
        stage: Stage,
        paths: Option<&[String]>,
    ) -> HashMap<String, Staleness> {
        let tracked = self.tracked.lock().await;
        let mut results = HashMap::new();

        let targets: Vec<&String> = match paths {
            Some(paths) => paths.iter().filter(|p| tracked.contains_key(p.as_str())).collect(),
            None => tracked.keys().collect(),
        };

        for file_path in targets {
            let snapshot = &tracked[file_path];
            let verdict = self.staleness_of(file_path, snapshot).await;
            if let Staleness::Stale { reason } = &verdict {
                self.bus
                    .publish(Event::new(
                        task_id,
                        mode,
                        stage,
                        EventPayload::StaleContextDetected {
                            file_path: file_path.clone(),
                            reason: reason.clone(),
                        },
                    ))
                    .await
                    .ok();
            }
            results.insert(file_path.clone(), verdict);
        }
        results
    }

    async fn staleness_of(&self, file_path: &str, snapshot: &TrackedSnapshot) -> Staleness {
        let path = PathBuf::from(file_path);
        let current_mtime = match self.fs.metadata_mtime(&path).await {
            Ok(mtime) => mtime,
            Err(_) => return Staleness::Stale { reason: "file no longer exists".to_string() },
        };
        if current_mtime == snapshot.mtime {
            return Staleness::Fresh;
        }

        debug!(file_path, "mtime changed since snapshot, re-hashing");
        let bytes = match self.fs.read_file(&path).await {
            Ok(bytes) => bytes,
            Err(_) => return Staleness::Stale { reason: "file no longer exists".to_string() },
        };
        let content = String::from_utf8_lossy(&bytes);
        let all_lines: Vec<&str> = content.lines().collect();
        let start = snapshot.line_start as usize;
        let end = snapshot.line_end as usize;
        if end > all_lines.len() {
            return Staleness::Stale { reason: "tracked line range no longer exists".to_string() };
        }
        let current_hash = hash_lines(&all_lines[start..end]);
        if current_hash == snapshot.content_hash {
            Staleness::Fresh
        } else {
            Staleness::Stale { reason: "content changed since snapshot".to_string() }
        }
    }

    /// Explicitly drop a tracked snapshot, e.g. after its diff applies.
    pub async fn invalidate(&self, file_path: &str) {
        self.tracked.lock().await.remove(file_path);
    }
}

#[cfg(test)]
#[path = "snapshot.test.rs"]
mod tests;
