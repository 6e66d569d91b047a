//! Verify Manager: orchestrates spec.md §4.13's nine-step algorithm.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use corestack_config::VerifyMode;
use corestack_config::VerifyPolicyConfig;
use corestack_event_log::EventBus;
use corestack_mode::ModeManager;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::FileSystemAdapter;
use corestack_protocol::Mode;
use corestack_protocol::Stage;
use corestack_protocol::VerifyStatus;
use snafu::ResultExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::discovery::discover_commands;
use crate::error::AllCommandsFilteredSnafu;
use crate::error::EvidencePersistSnafu;
use crate::error::EvidenceWriteSnafu;
use crate::error::NoCommandsDiscoveredSnafu;
use crate::error::Result;
use crate::error::StageTransitionSnafu;
use crate::executor::run_command_phase;
use crate::types::CommandOutcome;
use crate::types::DedupKey;
use crate::types::DiscoveredCommand;
use crate::types::VerifyOutcome;

/// One verify entry point, identified by the `(run_id, mission_id,
/// step_id)` triple re-entry is deduplicated against (spec.md §4.13).
pub struct VerifyRequest<'a> {
    pub task_id: &'a str,
    pub mode: Mode,
    pub run_id: &'a str,
    pub mission_id: &'a str,
    pub step_id: &'a str,
    /// Step 1 of spec.md §4.13's algorithm: "If replay -> emit
    /// `verify_skipped` and return `skipped`." Distinct from the
    /// `(run_id, mission_id, step_id)` dedup cache below — that cache is
    /// an internal no-op re-entry guard, not this caller-supplied flag.
    pub replay: bool,
    /// Step 4's "optional user-supplied command override": when set, this
    /// command is used in place of the discovery chain, still subject to
    /// the usual policy allow/blocklist filtering.
    pub command_override: Option<String>,
}

/// Orchestrates discovery, policy filtering, and the shared command phase
/// for the verify mission stage.
pub struct VerifyManager {
    bus: Arc<EventBus>,
    mode_manager: Arc<ModeManager>,
    fs: Arc<dyn FileSystemAdapter>,
    workspace_root: PathBuf,
    evidence_dir: PathBuf,
    policy: VerifyPolicyConfig,
    seen: Mutex<HashMap<DedupKey, VerifyOutcome>>,
}

impl VerifyManager {
    pub fn new(bus: Arc<EventBus>, mode_manager: Arc<ModeManager>, fs: Arc<dyn FileSystemAdapter>, workspace_root: impl Into<PathBuf>, evidence_dir: impl Into<PathBuf>, policy: VerifyPolicyConfig) -> Self {
        Self {
            bus,
            mode_manager,
            fs,
            workspace_root: workspace_root.into(),
            evidence_dir: evidence_dir.into(),
            policy,
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn transcript_path(&self, run_id: &str) -> PathBuf {
        self.evidence_dir.join(format!("verify-{run_id}.transcript.json"))
    }

    fn filter_by_policy(&self, discovered: Vec<DiscoveredCommand>) -> Vec<DiscoveredCommand> {
        if !self.policy.allowlist.is_empty() {
            discovered.into_iter().filter(|c| self.policy.allowlist.iter().any(|a| a == &c.name)).collect()
        } else {
            discovered.into_iter().filter(|c| !self.policy.blocklist.iter().any(|b| b == &c.name)).collect()
        }
    }

    async fn persist_transcript(&self, run_id: &str, outcomes: &[CommandOutcome]) -> Result<String> {
        self.fs.create_dir_all(&self.evidence_dir).await.ok();
        let path = self.transcript_path(run_id);
        let bytes = serde_json::to_vec_pretty(outcomes).with_context(|_| EvidencePersistSnafu { path: path.display().to_string() })?;
        self.fs
            .write_file(&path, &bytes)
            .await
            .with_context(|_| EvidenceWriteSnafu { path: path.display().to_string() })?;
        Ok(path.display().to_string())
    }

    /// Run the nine-step verify algorithm (spec.md §4.13):
    /// 1. replay check, 2. stage transition, 3. policy-off short circuit,
    /// 4. discover commands (or use the caller's override), 5.
    /// empty-discovered decision point, 6. policy filter, 7.
    /// empty-filtered decision point, 8. prompt-mode proposal, 9.
    /// auto-mode command phase with transcript persistence.
    pub async fn run_verify(&self, request: VerifyRequest<'_>) -> Result<VerifyOutcome> {
        if request.replay {
            let outcome = VerifyOutcome::skipped("replay");
            self.publish(request.task_id, request.mode, EventPayload::VerifySkipped { reason: "replay".to_string() }).await;
            return Ok(outcome);
        }

        let dedup_key: DedupKey = (request.run_id.to_string(), request.mission_id.to_string(), request.step_id.to_string());
        if let Some(previous) = self.seen.lock().await.get(&dedup_key) {
            info!(run_id = request.run_id, mission_id = request.mission_id, step_id = request.step_id, "verify already ran for this step, re-entry is a no-op");
            return Ok(previous.clone());
        }

        self.mode_manager
            .set_stage(request.task_id, Stage::Verify)
            .await
            .context(StageTransitionSnafu)?;

        if self.policy.mode == VerifyMode::Off {
            let outcome = VerifyOutcome::skipped("verify policy is off");
            self.publish(request.task_id, request.mode, EventPayload::VerifySkipped { reason: "verify policy is off".to_string() }).await;
            self.remember(dedup_key, outcome.clone()).await;
            return Ok(outcome);
        }

        let discovered = match &request.command_override {
            Some(command) => vec![DiscoveredCommand {
                name: "override".to_string(),
                command: command.clone(),
                source: crate::types::CommandSource::UserOverride,
            }],
            None => discover_commands(self.fs.as_ref(), &self.workspace_root, &self.policy.fallback_commands).await,
        };
        if discovered.is_empty() {
            self.publish(
                request.task_id,
                request.mode,
                EventPayload::DecisionPointNeeded {
                    question: "no verify commands could be discovered; how should the task proceed?".to_string(),
                    options: vec!["skip verification".to_string(), "configure fallback commands".to_string()],
                },
            )
            .await;
            return NoCommandsDiscoveredSnafu { task_id: request.task_id.to_string() }.fail();
        }

        let filtered = self.filter_by_policy(discovered);
        if filtered.is_empty() {
            self.publish(
                request.task_id,
                request.mode,
                EventPayload::DecisionPointNeeded {
                    question: "policy filtering removed every discovered verify command; how should the task proceed?".to_string(),
                    options: vec!["skip verification".to_string(), "adjust allowlist/blocklist".to_string()],
                },
            )
            .await;
            return AllCommandsFilteredSnafu { task_id: request.task_id.to_string() }.fail();
        }

        let command_names: Vec<String> = filtered.iter().map(|c| c.name.clone()).collect();

        if self.policy.mode == VerifyMode::Prompt {
            self.publish(request.task_id, request.mode, EventPayload::VerifyProposed { commands: command_names }).await;
            let outcome = VerifyOutcome::skipped("awaiting prompt-mode approval");
            self.remember(dedup_key, outcome.clone()).await;
            return Ok(outcome);
        }

        self.publish(request.task_id, request.mode, EventPayload::VerifyStarted { commands: command_names }).await;

        let outcomes = run_command_phase(&filtered, &self.workspace_root, &self.policy).await;
        let transcript_evidence_id = self.persist_transcript(request.run_id, &outcomes).await.ok();

        let failed = outcomes.last().filter(|o| o.timed_out || o.exit_code != Some(0));
        let outcome = match failed {
            Some(failed) => VerifyOutcome {
                status: VerifyStatus::Fail,
                failed_command: Some(failed.name.clone()),
                exit_code: failed.exit_code,
                transcript_evidence_id: transcript_evidence_id.clone(),
                timed_out: failed.timed_out,
                reason: None,
            },
            None => VerifyOutcome {
                status: VerifyStatus::Pass,
                failed_command: None,
                exit_code: Some(0),
                transcript_evidence_id: transcript_evidence_id.clone(),
                timed_out: false,
                reason: None,
            },
        };

        self.publish(
            request.task_id,
            request.mode,
            EventPayload::VerifyCompleted {
                status: outcome.status,
                failed_command: outcome.failed_command.clone(),
                exit_code: outcome.exit_code,
                transcript_evidence_id: outcome.transcript_evidence_id.clone(),
            },
        )
        .await;

        self.remember(dedup_key, outcome.clone()).await;
        Ok(outcome)
    }

    async fn publish(&self, task_id: &str, mode: Mode, payload: EventPayload) {
        let stage = self.mode_manager.current(task_id).await.1;
        let _ = self.bus.publish(Event::new(task_id, mode, stage, payload)).await;
    }

    async fn remember(&self, key: DedupKey, outcome: VerifyOutcome) {
        self.seen.lock().await.insert(key, outcome);
    }
}

#[cfg(test)]
#[path = "manager.test.rs"]
mod tests;
