//! Repair data model (spec.md §4.14).

use corestack_diff::DiffEntry;
use serde::Deserialize;
use serde::Serialize;

/// The last test-failure record a verify run handed to the repair
/// orchestrator.
#[derive(Debug, Clone)]
pub struct TestFailureRecord {
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub summary: String,
}

/// Where a [`Diagnosis`] came from. Carries the rejection reason when the
/// LLM path was attempted but rejected, falling back to the heuristic path
/// (spec.md §4.14: "reject ... on stop_reason=max_tokens, on JSON parse
/// failure, or on missing required fields").
#[derive(Debug, Clone)]
pub enum DiagnosisSource {
    Llm,
    Heuristic { llm_rejected_reason: Option<String> },
}

impl DiagnosisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Heuristic { .. } => "heuristic",
        }
    }
}

/// The strict-JSON shape requested from the model for `diagnose_llm`
/// (spec.md §4.14).
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisResponse {
    pub failure_summary: String,
    pub likely_causes: Vec<String>,
    pub affected_files: Vec<String>,
    #[serde(default)]
    pub root_cause_file: Option<String>,
    pub suggested_fix_approach: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// `diagnose_failure`'s result, regardless of source.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub source: DiagnosisSource,
    pub failure_summary: String,
    pub likely_causes: Vec<String>,
    pub affected_files: Vec<String>,
    pub root_cause_file: Option<String>,
    pub suggested_fix_approach: String,
    pub confidence: Option<f64>,
}

/// One file the model wants touched, with the content it should contain
/// after the fix (spec.md §4.14: "for each touched file, treat `modify` as
/// requiring a successful read ... translate to diff manager entries").
#[derive(Debug, Clone, Deserialize)]
pub struct TouchedFile {
    pub path: String,
    pub new_content: String,
}

/// The strict-JSON shape requested from the model for `propose_repair_fix`
/// (spec.md §4.14).
#[derive(Debug, Clone, Deserialize)]
pub struct FixProposalResponse {
    pub touched_files: Vec<TouchedFile>,
    pub explanation: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Where a proposed fix's diff entries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixSource {
    Llm,
    Heuristic,
}

/// `propose_repair_fix`'s result: the diff manager's proposal id plus
/// bookkeeping about how it was produced.
#[derive(Debug, Clone)]
pub struct RepairFixProposal {
    pub diff_id: String,
    pub source: FixSource,
    pub explanation: String,
    pub entries: Vec<DiffEntry>,
}
