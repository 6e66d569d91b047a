//! Checkpoint manager (spec.md §4.8).

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use corestack_event_log::EventBus;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::FileSystemAdapter;
use corestack_protocol::Mode;
use corestack_protocol::RestoreMethod;
use corestack_protocol::Stage;
use snafu::ResultExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::CheckpointError;
use crate::error::checkpoint_error::GitMethodUnsupportedSnafu;
use crate::error::checkpoint_error::LoadSnafu;
use crate::error::checkpoint_error::NotFoundSnafu;
use crate::error::checkpoint_error::ParseSnafu;
use crate::error::checkpoint_error::PersistSnafu;
use crate::error::checkpoint_error::ReadSnafu;
use crate::error::checkpoint_error::RestoreSnafu;
use crate::types::CheckpointMeta;
use crate::types::CheckpointRegistry;
use crate::types::CheckpointSnapshotFile;
use crate::types::FileSnapshot;

/// Creates pre-mutation snapshots of a file set and restores them
/// byte-identically on demand (spec.md §4.8). Never garbage-collected in
/// V1, per spec.md §3.
pub struct CheckpointManager {
    bus: Arc<EventBus>,
    fs: Arc<dyn FileSystemAdapter>,
    storage_dir: PathBuf,
    registry: Mutex<CheckpointRegistry>,
    snapshots: Mutex<HashMap<String, CheckpointSnapshotFile>>,
}

impl CheckpointManager {
    pub fn new(bus: Arc<EventBus>, fs: Arc<dyn FileSystemAdapter>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            bus,
            fs,
            storage_dir: storage_dir.into(),
            registry: Mutex::new(CheckpointRegistry::default()),
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    fn registry_path(&self) -> PathBuf {
        self.storage_dir.join("checkpoints.json")
    }

    fn snapshot_path(&self, checkpoint_id: &str) -> PathBuf {
        self.storage_dir.join(format!("{checkpoint_id}.json"))
    }

    /// Take a pre-mutation snapshot of every existing path in `scope`.
    /// Missing paths are skipped (nothing to snapshot before a `create`).
    pub async fn create_checkpoint(
        &self,
        task_id: &str,
        mode: Mode,
        stage: Stage,
        description: impl Into<String>,
        scope: &[PathBuf],
        method: RestoreMethod,
    ) -> Result<String, CheckpointError> {
        if matches!(method, RestoreMethod::Git) {
            return GitMethodUnsupportedSnafu.fail();
        }

        let checkpoint_id = uuid::Uuid::new_v4().to_string();
        let mut files = Vec::new();
        for path in scope {
            if !self.fs.exists(path).await {
                continue;
            }
            let content = self.fs.read_file(path).await.with_context(|_| ReadSnafu {
                path: path.display().to_string(),
            })?;
            files.push(FileSnapshot {
                filepath: path.display().to_string(),
                content,
            });
        }

        self.fs
            .create_dir_all(&self.storage_dir)
            .await
            .with_context(|_| ReadSnafu {
                path: self.storage_dir.display().to_string(),
            })?;

        let snapshot_file = CheckpointSnapshotFile {
            checkpoint_id: checkpoint_id.clone(),
            created_at: Utc::now(),
            scope: scope.iter().map(|p| p.display().to_string()).collect(),
            files: files.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot_file).with_context(|_| PersistSnafu {
            path: self.snapshot_path(&checkpoint_id).display().to_string(),
        })?;
        self.fs
            .write_file(&self.snapshot_path(&checkpoint_id), &bytes)
            .await
            .with_context(|_| ReadSnafu {
                path: self.snapshot_path(&checkpoint_id).display().to_string(),
            })?;

        let description = description.into();
        let meta = CheckpointMeta {
            checkpoint_id: checkpoint_id.clone(),
            created_at: Utc::now(),
            associated_event_id: None,
            restore_method: method,
            scope: scope.iter().map(|p| p.display().to_string()).collect(),
            description: description.clone(),
        };

        {
            let mut registry = self.registry.lock().await;
            registry.checkpoints.push(meta);
            registry.active_checkpoint_id = Some(checkpoint_id.clone());
            self.persist_registry(&registry).await?;
        }
        self.snapshots.lock().await.insert(checkpoint_id.clone(), snapshot_file);

        let event = self
            .bus
            .publish(Event::new(
                task_id,
                mode,
                stage,
                EventPayload::CheckpointCreated {
                    checkpoint_id: checkpoint_id.clone(),
                    scope: scope.iter().map(|p| p.display().to_string()).collect(),
                    description,
                },
            ))
            .await;
        if let Ok(event) = event {
            info!(checkpoint_id = %checkpoint_id, event_id = %event.event_id, "checkpoint created");
        }

        Ok(checkpoint_id)
    }

    async fn persist_registry(&self, registry: &CheckpointRegistry) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec_pretty(registry).with_context(|_| PersistSnafu {
            path: self.registry_path().display().to_string(),
        })?;
        self.fs
            .write_file(&self.registry_path(), &bytes)
            .await
            .with_context(|_| ReadSnafu {
                path: self.registry_path().display().to_string(),
            })?;
        Ok(())
    }

    async fn load_snapshot_from_disk(&self, checkpoint_id: &str) -> Result<CheckpointSnapshotFile, CheckpointError> {
        let path = self.snapshot_path(checkpoint_id);
        if !self.fs.exists(&path).await {
            return NotFoundSnafu {
                checkpoint_id: checkpoint_id.to_string(),
            }
            .fail();
        }
        let bytes = self.fs.read_file(&path).await.with_context(|_| LoadSnafu {
            path: path.display().to_string(),
        })?;
        let snapshot: CheckpointSnapshotFile =
            serde_json::from_slice(&bytes).with_context(|_| ParseSnafu {
                path: path.display().to_string(),
            })?;
        Ok(snapshot)
    }

    /// Re-materialize every file recorded in `checkpoint_id`'s snapshot,
    /// verbatim. Restore is deterministic (spec.md invariant P5): the same
    /// checkpoint always yields byte-identical files.
    pub async fn restore_checkpoint(
        &self,
        checkpoint_id: &str,
        task_id: &str,
        mode: Mode,
        stage: Stage,
    ) -> Result<(), CheckpointError> {
        let snapshot = {
            let cached = self.snapshots.lock().await.get(checkpoint_id).cloned();
            match cached {
                Some(snapshot) => snapshot,
                None => {
                    let snapshot = self.load_snapshot_from_disk(checkpoint_id).await?;
                    self.snapshots
                        .lock()
                        .await
                        .insert(checkpoint_id.to_string(), snapshot.clone());
                    snapshot
                }
            }
        };

        for file in &snapshot.files {
            let path = Path::new(&file.filepath);
            if let Some(parent) = path.parent() {
                self.fs.create_dir_all(parent).await.with_context(|_| RestoreSnafu {
                    checkpoint_id: checkpoint_id.to_string(),
                    path: file.filepath.clone(),
                })?;
            }
            self.fs
                .write_file(path, &file.content)
                .await
                .with_context(|_| RestoreSnafu {
                    checkpoint_id: checkpoint_id.to_string(),
                    path: file.filepath.clone(),
                })?;
        }

        // Anything in scope but absent from `files` had no content at
        // snapshot time (e.g. a path a diff was about to `create`).
        // Restoring to that pre-checkpoint state means it must not exist
        // afterward, so undo the creation rather than leaving it behind.
        let snapshotted: std::collections::HashSet<&str> = snapshot.files.iter().map(|f| f.filepath.as_str()).collect();
        for scoped_path in &snapshot.scope {
            if snapshotted.contains(scoped_path.as_str()) {
                continue;
            }
            let path = Path::new(scoped_path);
            if self.fs.exists(path).await {
                self.fs.remove_file(path).await.with_context(|_| RestoreSnafu {
                    checkpoint_id: checkpoint_id.to_string(),
                    path: scoped_path.clone(),
                })?;
            }
        }

        self.registry.lock().await.active_checkpoint_id = Some(checkpoint_id.to_string());

        let event = self
            .bus
            .publish(Event::new(
                task_id,
                mode,
                stage,
                EventPayload::CheckpointRestored {
                    checkpoint_id: checkpoint_id.to_string(),
                },
            ))
            .await;
        if let Ok(event) = event {
            info!(checkpoint_id = %checkpoint_id, event_id = %event.event_id, "checkpoint restored");
        }
        Ok(())
    }

    pub async fn active_checkpoint_id(&self) -> Option<String> {
        self.registry.lock().await.active_checkpoint_id.clone()
    }

    pub async fn list_checkpoints(&self) -> Vec<CheckpointMeta> {
        self.registry.lock().await.checkpoints.clone()
    }
}

#[cfg(test)]
#[path = "manager.test.rs"]
mod tests;
