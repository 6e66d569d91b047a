//! `propose_repair_fix` (spec.md §4.14): an LLM-backed path that reads file
//! excerpts and proposes targeted edits, falling back to a single
//! documentation-entry heuristic when the model is unavailable or its
//! response doesn't satisfy the contract.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use corestack_diff::DiffEntry;
use corestack_diff::DiffManager;
use corestack_protocol::ContentBlock;
use corestack_protocol::CreateMessageRequest;
use corestack_protocol::DiffOperation;
use corestack_protocol::FileSystemAdapter;
use corestack_protocol::Message;
use corestack_protocol::Mode;
use corestack_protocol::ModelClient;
use corestack_protocol::Stage;
use sha2::Digest;
use sha2::Sha256;
use snafu::ResultExt;
use tracing::info;

use crate::error::RepairError;
use crate::error::repair_error::DiffProposalSnafu;
use crate::error::repair_error::FixTransportSnafu;
use crate::types::Diagnosis;
use crate::types::FixProposalResponse;
use crate::types::FixSource;
use crate::types::RepairFixProposal;
use crate::types::TouchedFile;

const FIX_MODEL: &str = "repair-fix";
const FIX_MAX_TOKENS: u32 = 4096;
const MAX_TOUCHED_FILES: usize = 5;
const MAX_EXCERPT_CHARS: usize = 4096;

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

async fn read_excerpt(fs: &dyn FileSystemAdapter, workspace_root: &Path, path: &str) -> Option<String> {
    let bytes = fs.read_file(&workspace_root.join(path)).await.ok()?;
    let text = String::from_utf8_lossy(&bytes);
    Some(text.chars().take(MAX_EXCERPT_CHARS).collect())
}

async fn fix_prompt(fs: &dyn FileSystemAdapter, workspace_root: &Path, diagnosis: &Diagnosis) -> String {
    let mut excerpts = String::new();
    for path in &diagnosis.affected_files {
        if let Some(excerpt) = read_excerpt(fs, workspace_root, path).await {
            excerpts.push_str(&format!("\n--- {path} ---\n{excerpt}\n"));
        }
    }

    format!(
        "A verify command failed. Diagnosis: {summary}\nSuggested approach: {approach}\nAffected files:\n{excerpts}\n\n\
         Propose a fix and respond with a strict JSON object of the shape \
         {{\"touched_files\": [{{\"path\": string, \"new_content\": string}}] (at most {max}), \"explanation\": string, \"confidence\": number | null}}. \
         Respond with JSON only, no surrounding prose.",
        summary = diagnosis.failure_summary,
        approach = diagnosis.suggested_fix_approach,
        excerpts = excerpts,
        max = MAX_TOUCHED_FILES,
    )
}

fn parse_fix_response(text: &str) -> Option<FixProposalResponse> {
    let response: FixProposalResponse = serde_json::from_str(text).ok()?;
    if response.touched_files.is_empty() || response.explanation.trim().is_empty() {
        return None;
    }
    Some(response)
}

async fn propose_llm(model: &dyn ModelClient, fs: &dyn FileSystemAdapter, workspace_root: &Path, diagnosis: &Diagnosis, task_id: &str) -> Result<Option<FixProposalResponse>, RepairError> {
    let prompt = fix_prompt(fs, workspace_root, diagnosis).await;
    let messages = [Message::user(prompt)];
    let request = CreateMessageRequest {
        model: FIX_MODEL,
        max_tokens: FIX_MAX_TOKENS,
        system: None,
        messages: &messages,
        tools: None,
    };

    let response = model.create_message(request).await.map_err(|message| {
        FixTransportSnafu {
            task_id: task_id.to_string(),
            message,
        }
        .build()
    })?;

    let text = response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");

    Ok(parse_fix_response(&text))
}

async fn touched_files_to_entries(fs: &dyn FileSystemAdapter, workspace_root: &Path, touched: &[TouchedFile]) -> Vec<DiffEntry> {
    let mut entries = Vec::with_capacity(touched.len().min(MAX_TOUCHED_FILES));
    for file in touched.iter().take(MAX_TOUCHED_FILES) {
        let existing = fs.read_file(&workspace_root.join(&file.path)).await.ok();
        let (operation, pre_change_hash) = match &existing {
            Some(bytes) => (DiffOperation::Modify, Some(hash_bytes(bytes))),
            None => (DiffOperation::Create, None),
        };
        entries.push(DiffEntry {
            path: file.path.clone(),
            operation,
            new_content: Some(file.new_content.clone().into_bytes()),
            pre_change_hash,
        });
    }
    entries
}

fn heuristic_entry(diagnosis: &Diagnosis) -> DiffEntry {
    let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let content = format!(
        "# Repair attempt\n\n## Diagnosis\n\n{summary}\n\n## Suggested approach\n\n{approach}\n\n## Likely causes\n\n{causes}\n",
        summary = diagnosis.failure_summary,
        approach = diagnosis.suggested_fix_approach,
        causes = diagnosis.likely_causes.join("\n- "),
    );
    DiffEntry {
        path: format!("docs/repair_attempt_{timestamp}.md"),
        operation: DiffOperation::Create,
        new_content: Some(content.into_bytes()),
        pre_change_hash: None,
    }
}

/// Propose a fix for `diagnosis`, entering it into the diff manager's
/// standard propose-approval-apply path (spec.md §4.14).
#[allow(clippy::too_many_arguments)]
pub async fn propose_repair_fix(
    model: Option<&Arc<dyn ModelClient>>,
    fs: &dyn FileSystemAdapter,
    diff: &DiffManager,
    workspace_root: &Path,
    diagnosis: &Diagnosis,
    task_id: &str,
    mode: Mode,
    stage: Stage,
    step_id: impl Into<String>,
) -> Result<RepairFixProposal, RepairError> {
    let step_id = step_id.into();

    let (source, explanation, entries) = match model {
        Some(model) => match propose_llm(model.as_ref(), fs, workspace_root, diagnosis, task_id).await? {
            Some(response) => {
                let entries = touched_files_to_entries(fs, workspace_root, &response.touched_files).await;
                (FixSource::Llm, response.explanation, entries)
            }
            None => {
                info!(task_id, "fix proposal rejected, falling back to a documentation entry");
                let entry = heuristic_entry(diagnosis);
                (FixSource::Heuristic, "model response rejected; recorded a documentation summary instead".to_string(), vec![entry])
            }
        },
        None => {
            info!(task_id, "no model configured, falling back to a documentation entry");
            let entry = heuristic_entry(diagnosis);
            (FixSource::Heuristic, "no model configured; recorded a documentation summary instead".to_string(), vec![entry])
        }
    };

    let diff_id = diff
        .propose_diff(
            task_id,
            mode,
            stage,
            step_id,
            format!("repair: {}", diagnosis.failure_summary),
            explanation.clone(),
            diagnosis.affected_files.clone(),
            entries.clone(),
            true,
            diagnosis.confidence,
        )
        .await
        .context(DiffProposalSnafu)?;

    Ok(RepairFixProposal {
        diff_id,
        source,
        explanation,
        entries,
    })
}

#[cfg(test)]
#[path = "fix.test.rs"]
mod tests;
