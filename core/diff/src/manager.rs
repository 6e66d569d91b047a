//! Diff Manager: validates and atomically applies proposed patches
//! (spec.md §4.9).

use std::collections::HashMap;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use corestack_checkpoint::CheckpointManager;
use corestack_context::SnapshotManager;
use corestack_context::Staleness;
use corestack_event_log::EventBus;
use corestack_protocol::DiffOperation;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::FileSystemAdapter;
use corestack_protocol::Mode;
use corestack_protocol::RestoreMethod;
use corestack_protocol::Stage;
use sha2::Digest;
use sha2::Sha256;
use snafu::IntoError;
use snafu::ResultExt;
use tokio::sync::Mutex;
use tracing::info;
use tracing::warn;

use crate::error::diff_error::ApplyEntryFailedSnafu;
use crate::error::diff_error::CheckpointSnafu;
use crate::error::DiffError;
use crate::error::diff_error::EvidencePersistSnafu;
use crate::error::diff_error::EvidenceWriteSnafu;
use crate::error::diff_error::MissingNewContentSnafu;
use crate::error::diff_error::MissingPreChangeHashSnafu;
use crate::error::diff_error::PathOutsideWorkspaceSnafu;
use crate::error::diff_error::ProposalNotFoundSnafu;
use crate::error::diff_error::StaleContextSnafu;
use crate::types::ApplyRecord;
use crate::types::DiffEntry;
use crate::types::DiffManifest;
use crate::types::DiffStats;
use crate::types::FileApplyRecord;
use crate::types::ProposedDiff;

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Rejects any `..` component (invariant: no diff entry escapes the
/// workspace root via traversal). Entries are otherwise caller-resolved
/// paths — relative to whatever root the injected `FileSystemAdapter`
/// treats as current, or already-absolute within the workspace — since
/// this manager, like the checkpoint and context-snapshot managers it
/// composes with, holds no workspace-root concept of its own (spec.md §1:
/// the concrete file system is an external collaborator).
fn validate_path(path: &str) -> Result<(), DiffError> {
    let p = Path::new(path);
    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return PathOutsideWorkspaceSnafu { path: path.to_string() }.fail();
    }
    Ok(())
}

fn validate_entry(entry: &DiffEntry) -> Result<(), DiffError> {
    validate_path(&entry.path)?;
    match entry.operation {
        DiffOperation::Create | DiffOperation::Modify => {
            if entry.new_content.is_none() {
                return MissingNewContentSnafu { path: entry.path.clone() }.fail();
            }
        }
        DiffOperation::Delete => {}
    }
    if matches!(entry.operation, DiffOperation::Modify) && entry.pre_change_hash.is_none() {
        return MissingPreChangeHashSnafu { path: entry.path.clone() }.fail();
    }
    Ok(())
}

fn render_diff_text(entry: &DiffEntry, previous: Option<&[u8]>) -> String {
    use similar::ChangeTag;
    use similar::TextDiff;

    match entry.operation {
        DiffOperation::Delete => format!("--- {p}\n+++ /dev/null\n", p = entry.path),
        DiffOperation::Create => {
            let new_text = String::from_utf8_lossy(entry.new_content.as_deref().unwrap_or_default());
            let mut out = format!("--- /dev/null\n+++ {p}\n", p = entry.path);
            for line in new_text.lines() {
                out.push('+');
                out.push_str(line);
                out.push('\n');
            }
            out
        }
        DiffOperation::Modify => {
            let old_text = String::from_utf8_lossy(previous.unwrap_or_default()).into_owned();
            let new_text = String::from_utf8_lossy(entry.new_content.as_deref().unwrap_or_default()).into_owned();
            let diff = TextDiff::from_lines(&old_text, &new_text);
            let mut out = format!("--- {p}\n+++ {p}\n", p = entry.path);
            for change in diff.iter_all_changes() {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };
                out.push_str(sign);
                out.push_str(change.as_str().unwrap_or_default());
            }
            out
        }
    }
}

/// Validates and atomically applies proposed patches (spec.md §4.9).
/// Contract: a `diff_applied` event implies every entry now reflects its
/// intended state on disk and the pre-change content is recoverable via
/// the checkpoint taken immediately before application.
pub struct DiffManager {
    bus: Arc<EventBus>,
    fs: Arc<dyn FileSystemAdapter>,
    checkpoint: Arc<CheckpointManager>,
    snapshot: Arc<SnapshotManager>,
    workspace_root: PathBuf,
    evidence_dir: PathBuf,
    proposals: Mutex<HashMap<String, ProposedDiff>>,
}

impl DiffManager {
    pub fn new(
        bus: Arc<EventBus>,
        fs: Arc<dyn FileSystemAdapter>,
        checkpoint: Arc<CheckpointManager>,
        snapshot: Arc<SnapshotManager>,
        workspace_root: impl Into<PathBuf>,
        evidence_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bus,
            fs,
            checkpoint,
            snapshot,
            workspace_root: workspace_root.into(),
            evidence_dir: evidence_dir.into(),
            proposals: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve an entry's path against the workspace root. Entries that
    /// already carry an absolute path (a caller-resolved location) pass
    /// through unchanged, since `Path::join` discards the base when the
    /// joined component is absolute.
    fn resolve(&self, path: &str) -> PathBuf {
        self.workspace_root.join(path)
    }

    fn diff_path(&self, diff_id: &str) -> PathBuf {
        self.evidence_dir.join(format!("{diff_id}.diff"))
    }

    fn manifest_path(&self, diff_id: &str) -> PathBuf {
        self.evidence_dir.join(format!("{diff_id}.manifest.json"))
    }

    fn apply_path(&self, diff_id: &str) -> PathBuf {
        self.evidence_dir.join(format!("{diff_id}.apply.json"))
    }

    /// Validate `files`, optionally take a checkpoint over the affected
    /// paths, persist raw diff + manifest, emit `diff_proposed`, and
    /// return the new proposal's id.
    #[allow(clippy::too_many_arguments)]
    pub async fn propose_diff(
        &self,
        task_id: &str,
        mode: Mode,
        stage: Stage,
        step_id: impl Into<String>,
        description: impl Into<String>,
        summary: impl Into<String>,
        source_context: Vec<String>,
        files: Vec<DiffEntry>,
        requires_checkpoint: bool,
        model_confidence: Option<f64>,
    ) -> Result<String, DiffError> {
        for entry in &files {
            validate_entry(entry)?;
        }

        let diff_id = uuid::Uuid::new_v4().to_string();
        let step_id = step_id.into();
        let description = description.into();
        let summary = summary.into();

        let checkpoint_id = if requires_checkpoint {
            let scope: Vec<PathBuf> = files.iter().map(|e| self.resolve(&e.path)).collect();
            let id = self
                .checkpoint
                .create_checkpoint(task_id, mode, stage, format!("pre-diff: {description}"), &scope, RestoreMethod::Snapshot)
                .await
                .context(CheckpointSnafu)?;
            Some(id)
        } else {
            None
        };

        self.fs.create_dir_all(&self.evidence_dir).await.ok();

        let mut diff_text = String::new();
        let mut stats = DiffStats::default();
        for entry in &files {
            let previous = if matches!(entry.operation, DiffOperation::Modify) {
                self.fs.read_file(&self.resolve(&entry.path)).await.ok()
            } else {
                None
            };
            diff_text.push_str(&render_diff_text(entry, previous.as_deref()));
            match entry.operation {
                DiffOperation::Create => stats.files_created += 1,
                DiffOperation::Modify => stats.files_modified += 1,
                DiffOperation::Delete => stats.files_deleted += 1,
            }
        }
        self.fs
            .write_file(&self.diff_path(&diff_id), diff_text.as_bytes())
            .await
            .with_context(|_| EvidenceWriteSnafu {
                path: self.diff_path(&diff_id).display().to_string(),
            })?;

        let manifest = DiffManifest {
            diff_id: diff_id.clone(),
            step_id: step_id.clone(),
            description: description.clone(),
            summary: summary.clone(),
            source_context: source_context.clone(),
            validation_report: vec!["all entries passed path/operation validation".to_string()],
            stats,
            model_confidence,
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest).with_context(|_| EvidencePersistSnafu {
            path: self.manifest_path(&diff_id).display().to_string(),
        })?;
        self.fs
            .write_file(&self.manifest_path(&diff_id), &manifest_bytes)
            .await
            .with_context(|_| EvidenceWriteSnafu {
                path: self.manifest_path(&diff_id).display().to_string(),
            })?;

        let proposal = ProposedDiff {
            diff_id: diff_id.clone(),
            step_id,
            description,
            summary: summary.clone(),
            source_context,
            files,
            requires_checkpoint,
            checkpoint_id,
            created_at: Utc::now(),
        };
        let file_count = proposal.files.len();
        let step_id = proposal.step_id.clone();
        self.proposals.lock().await.insert(diff_id.clone(), proposal);

        let event = self
            .bus
            .publish(Event::new(
                task_id,
                mode,
                stage,
                EventPayload::DiffProposed {
                    diff_id: diff_id.clone(),
                    step_id,
                    file_count,
                    summary,
                },
            ))
            .await;
        if let Ok(event) = event {
            info!(diff_id = %diff_id, event_id = %event.event_id, file_count, "diff proposed");
        }

        Ok(diff_id)
    }

    pub async fn get_proposal(&self, diff_id: &str) -> Option<ProposedDiff> {
        self.proposals.lock().await.get(diff_id).cloned()
    }

    /// Re-check staleness, take a pre-apply checkpoint, apply every entry
    /// in order, and roll back atomically on any per-entry failure
    /// (invariants D1, D2).
    pub async fn apply_diff(&self, diff_id: &str, task_id: &str, mode: Mode, stage: Stage) -> Result<(), DiffError> {
        let proposal = {
            let proposals = self.proposals.lock().await;
            proposals
                .get(diff_id)
                .cloned()
                .ok_or_else(|| ProposalNotFoundSnafu { diff_id: diff_id.to_string() }.build())?
        };

        let modify_paths: Vec<String> = proposal
            .files
            .iter()
            .filter(|e| matches!(e.operation, DiffOperation::Modify))
            .map(|e| e.path.clone())
            .collect();

        if !modify_paths.is_empty() {
            let staleness = self.snapshot.check_staleness(task_id, mode, stage, Some(&modify_paths)).await;
            for entry in proposal.files.iter().filter(|e| matches!(e.operation, DiffOperation::Modify)) {
                let expected_hash = entry.pre_change_hash.as_deref().unwrap_or_default();
                let actual = self.fs.read_file(&self.resolve(&entry.path)).await.ok();
                let actual_hash = actual.as_deref().map(hash_bytes);
                let mismatched = actual_hash.as_deref() != Some(expected_hash);
                let tracked_stale = matches!(staleness.get(&entry.path), Some(Staleness::Stale { .. }));
                if mismatched || tracked_stale {
                    let reason = if mismatched {
                        "content hash no longer matches the proposal's pre-change hash".to_string()
                    } else {
                        "tracked context snapshot is stale".to_string()
                    };
                    return StaleContextSnafu {
                        path: entry.path.clone(),
                        reason,
                    }
                    .fail();
                }
            }
        }

        let scope: Vec<PathBuf> = proposal.files.iter().map(|e| self.resolve(&e.path)).collect();
        let pre_apply_checkpoint = self
            .checkpoint
            .create_checkpoint(task_id, mode, stage, format!("pre-apply: {}", proposal.description), &scope, RestoreMethod::Snapshot)
            .await
            .context(CheckpointSnafu)?;

        let mut file_records = Vec::new();
        let mut failure: Option<DiffError> = None;

        for entry in &proposal.files {
            let before_hash = self.fs.read_file(&self.resolve(&entry.path)).await.ok().as_deref().map(hash_bytes);
            let result: std::io::Result<()> = match entry.operation {
                DiffOperation::Create | DiffOperation::Modify => {
                    self.fs
                        .write_file(&self.resolve(&entry.path), entry.new_content.as_deref().unwrap_or_default())
                        .await
                }
                DiffOperation::Delete => self.fs.remove_file(&self.resolve(&entry.path)).await,
            };
            match result {
                Ok(()) => {
                    let after_hash = self.fs.read_file(&self.resolve(&entry.path)).await.ok().as_deref().map(hash_bytes);
                    file_records.push(FileApplyRecord {
                        path: entry.path.clone(),
                        before_hash,
                        after_hash,
                    });
                }
                Err(source) => {
                    failure = Some(
                        ApplyEntryFailedSnafu {
                            path: entry.path.clone(),
                        }
                        .into_error(source),
                    );
                    break;
                }
            }
        }

        if let Some(error) = failure {
            warn!(diff_id, error = %error, "diff apply failed, rolling back from pre-apply checkpoint");
            self.checkpoint
                .restore_checkpoint(&pre_apply_checkpoint, task_id, mode, stage)
                .await
                .context(CheckpointSnafu)?;

            let record = ApplyRecord {
                diff_id: diff_id.to_string(),
                success: false,
                error: Some(error.to_string()),
                files: file_records,
                applied_at: Utc::now(),
            };
            self.persist_apply_record(diff_id, &record).await?;
            return Err(error);
        }

        let record = ApplyRecord {
            diff_id: diff_id.to_string(),
            success: true,
            error: None,
            files: file_records.clone(),
            applied_at: Utc::now(),
        };
        self.persist_apply_record(diff_id, &record).await?;

        for entry in &proposal.files {
            self.snapshot.invalidate(&entry.path).await;
        }

        let event = self
            .bus
            .publish(Event::new(
                task_id,
                mode,
                stage,
                EventPayload::DiffApplied {
                    diff_id: diff_id.to_string(),
                    files: file_records.iter().map(|f| f.path.clone()).collect(),
                },
            ))
            .await;
        if let Ok(event) = event {
            info!(diff_id, event_id = %event.event_id, "diff applied");
        }

        Ok(())
    }

    async fn persist_apply_record(&self, diff_id: &str, record: &ApplyRecord) -> Result<(), DiffError> {
        let bytes = serde_json::to_vec_pretty(record).with_context(|_| EvidencePersistSnafu {
            path: self.apply_path(diff_id).display().to_string(),
        })?;
        self.fs
            .write_file(&self.apply_path(diff_id), &bytes)
            .await
            .with_context(|_| EvidenceWriteSnafu {
                path: self.apply_path(diff_id).display().to_string(),
            })?;
        Ok(())
    }

    /// Reject a proposal without applying it (emits `diff_rejected`).
    pub async fn reject_diff(&self, diff_id: &str, reason: impl Into<String>, task_id: &str, mode: Mode, stage: Stage) {
        let reason = reason.into();
        let _ = self
            .bus
            .publish(Event::new(
                task_id,
                mode,
                stage,
                EventPayload::DiffRejected {
                    diff_id: diff_id.to_string(),
                    reason,
                },
            ))
            .await;
    }
}

#[cfg(test)]
#[path = "manager.test.rs"]
mod tests;
