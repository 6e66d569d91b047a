//! Verify-phase data model (spec.md §4.13).

use corestack_error::StatusCode;
use serde::Deserialize;
use serde::Serialize;

pub use corestack_protocol::VerifyStatus;

/// Where a [`DiscoveredCommand`] came from, per the discovery chain
/// (SPEC_FULL §4 "Verify command discovery detail").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    PackageManifestScript,
    MakefileTarget,
    ConfiguredFallback,
    /// The caller supplied a command override (spec.md §4.13 algorithm
    /// inputs), bypassing the discovery chain entirely.
    UserOverride,
}

/// One candidate verify command before policy filtering (spec.md §4.13
/// step 4).
#[derive(Debug, Clone)]
pub struct DiscoveredCommand {
    pub name: String,
    pub command: String,
    pub source: CommandSource,
}

/// The result of running one command through the shared command phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub name: String,
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub timed_out: bool,
}

/// Identifies one verify entry point: re-entry with the same key is a
/// no-op (spec.md §4.13 "Deduplication").
pub type DedupKey = (String, String, String);

/// The outcome of one `VerifyManager::run_verify` call (spec.md §4.13
/// step 9).
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub status: VerifyStatus,
    pub failed_command: Option<String>,
    pub exit_code: Option<i32>,
    pub transcript_evidence_id: Option<String>,
    pub timed_out: bool,
    pub reason: Option<String>,
}

impl VerifyOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: VerifyStatus::Skipped,
            failed_command: None,
            exit_code: None,
            transcript_evidence_id: None,
            timed_out: false,
            reason: Some(reason.into()),
        }
    }

    /// A status code a caller can log/report against a failed outcome
    /// (§7 "behavioral, not type names" — this is classification, not an
    /// error path the outcome itself took).
    pub fn status_code(&self) -> Option<StatusCode> {
        match self.status {
            VerifyStatus::Fail if self.timed_out => Some(StatusCode::CommandTimedOut),
            VerifyStatus::Fail => Some(StatusCode::CommandFailed),
            VerifyStatus::Pass | VerifyStatus::Skipped => None,
        }
    }
}
