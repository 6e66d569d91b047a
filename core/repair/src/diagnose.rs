//! `diagnose_failure` (spec.md §4.14): an LLM-backed path with a strict-JSON
//! contract, falling back to a heuristic extraction when no model is
//! configured or the model's response doesn't satisfy that contract.

use std::sync::Arc;
use std::sync::LazyLock;

use corestack_protocol::Content;
use corestack_protocol::ContentBlock;
use corestack_protocol::CreateMessageRequest;
use corestack_protocol::Message;
use corestack_protocol::ModelClient;
use corestack_protocol::StopReason;
use regex::Regex;
use tracing::info;

use crate::error::RepairError;
use crate::error::repair_error::DiagnosisTransportSnafu;
use crate::types::Diagnosis;
use crate::types::DiagnosisResponse;
use crate::types::DiagnosisSource;
use crate::types::TestFailureRecord;

const DIAGNOSIS_MODEL: &str = "repair-diagnosis";
const DIAGNOSIS_MAX_TOKENS: u32 = 1024;

#[allow(clippy::expect_used)]
static FILE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[\w./-]+/)?[\w-]+\.(?:rs|toml|js|ts|tsx|jsx|py|go|java|rb|json|yaml|yml)\b").expect("valid regex"));

fn diagnosis_prompt(failure: &TestFailureRecord) -> String {
    format!(
        "A verify command failed. Diagnose the failure and respond with a strict JSON object of the shape \
         {{\"failure_summary\": string, \"likely_causes\": string[] (at most 4), \"affected_files\": string[] (at most 5), \
         \"root_cause_file\": string | null, \"suggested_fix_approach\": string, \"confidence\": number | null}}. \
         Respond with JSON only, no surrounding prose.\n\n\
         command: {command}\nexit_code: {exit_code:?}\n\nstdout:\n{stdout}\n\nstderr:\n{stderr}",
        command = failure.command,
        exit_code = failure.exit_code,
        stdout = failure.stdout,
        stderr = failure.stderr,
    )
}

fn parse_diagnosis_response(text: &str) -> Option<DiagnosisResponse> {
    let response: DiagnosisResponse = serde_json::from_str(text).ok()?;
    if response.failure_summary.trim().is_empty() || response.suggested_fix_approach.trim().is_empty() {
        return None;
    }
    if response.likely_causes.len() > 4 || response.affected_files.len() > 5 {
        return None;
    }
    Some(response)
}

/// Attempt the LLM-backed diagnosis path. Returns `Ok(None)` for any
/// rejection (max_tokens, parse failure, missing fields) that should fall
/// back to the heuristic path; propagates transport errors.
async fn diagnose_llm(model: &dyn ModelClient, failure: &TestFailureRecord) -> Result<Option<DiagnosisResponse>, RepairError> {
    let messages = [Message::user(diagnosis_prompt(failure))];
    let request = CreateMessageRequest {
        model: DIAGNOSIS_MODEL,
        max_tokens: DIAGNOSIS_MAX_TOKENS,
        system: None,
        messages: &messages,
        tools: None,
    };

    let response = model.create_message(request).await.map_err(|message| {
        DiagnosisTransportSnafu {
            task_id: failure.command.clone(),
            message,
        }
        .build()
    })?;

    if response.stop_reason == StopReason::MaxTokens {
        return Ok(None);
    }

    let text = response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");

    Ok(parse_diagnosis_response(&text))
}

fn diagnose_heuristic(failure: &TestFailureRecord, llm_rejected_reason: Option<String>) -> Diagnosis {
    let combined = format!("{}\n{}", failure.stderr, failure.stdout);
    let affected_files: Vec<String> = {
        let mut seen = std::collections::HashSet::new();
        FILE_PATH_RE
            .find_iter(&combined)
            .map(|m| m.as_str().to_string())
            .filter(|path| seen.insert(path.clone()))
            .take(5)
            .collect()
    };

    let root_cause_file = affected_files.first().cloned();
    let failure_summary = if affected_files.is_empty() {
        "unknown — check test output".to_string()
    } else {
        format!("command `{}` failed; likely related to {}", failure.command, affected_files.join(", "))
    };

    Diagnosis {
        source: DiagnosisSource::Heuristic { llm_rejected_reason },
        failure_summary,
        likely_causes: vec![
            "the command's exit code indicates a failing check".to_string(),
            "recently changed files may be implicated".to_string(),
        ],
        affected_files,
        root_cause_file,
        suggested_fix_approach: "inspect the failing command's output and adjust the implicated files".to_string(),
        confidence: None,
    }
}

/// Diagnose a test failure: try the model if configured, otherwise (or on
/// any rejection) fall back to the heuristic extraction (spec.md §4.14).
pub async fn diagnose_failure(model: Option<&Arc<dyn ModelClient>>, failure: &TestFailureRecord) -> Result<Diagnosis, RepairError> {
    let Some(model) = model else {
        info!(command = %failure.command, "no model configured, diagnosing via heuristic");
        return Ok(diagnose_heuristic(failure, None));
    };

    match diagnose_llm(model.as_ref(), failure).await? {
        Some(response) => Ok(Diagnosis {
            source: DiagnosisSource::Llm,
            failure_summary: response.failure_summary,
            likely_causes: response.likely_causes,
            affected_files: response.affected_files,
            root_cause_file: response.root_cause_file,
            suggested_fix_approach: response.suggested_fix_approach,
            confidence: response.confidence,
        }),
        None => {
            info!(command = %failure.command, "model diagnosis rejected, falling back to heuristic");
            Ok(diagnose_heuristic(failure, Some("model response rejected: max_tokens, parse failure, or missing fields".to_string())))
        }
    }
}

#[cfg(test)]
#[path = "diagnose.test.rs"]
mod tests;
