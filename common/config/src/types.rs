//! Typed configuration consumed by the managers (spec.md §4, SPEC_FULL §3.3).

use serde::Deserialize;
use serde::Serialize;

/// Verify-phase policy (spec.md §4.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    Off,
    Prompt,
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyPolicyConfig {
    pub mode: VerifyMode,
    pub allowlist: Vec<String>,
    pub blocklist: Vec<String>,
    pub max_output_bytes: usize,
    pub chunk_throttle_ms: u64,
    pub timeout_secs: u64,
    /// Last resort in the discovery chain (package manifest scripts ->
    /// Makefile targets -> this list), used when neither source yields a
    /// command (SPEC_FULL §4 "Verify command discovery detail").
    pub fallback_commands: Vec<String>,
}

impl Default for VerifyPolicyConfig {
    fn default() -> Self {
        Self {
            mode: VerifyMode::Prompt,
            allowlist: Vec::new(),
            blocklist: Vec::new(),
            max_output_bytes: 64 * 1024,
            chunk_throttle_ms: 200,
            timeout_secs: 300,
            fallback_commands: Vec::new(),
        }
    }
}

/// Autonomy controller budgets (spec.md §3 "Autonomy budgets").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomyBudgetsConfig {
    pub max_iterations: u32,
    pub max_wall_time_secs: u64,
    pub max_tool_calls: u32,
}

impl Default for AutonomyBudgetsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_wall_time_secs: 20 * 60,
            max_tool_calls: 100,
        }
    }
}

/// Agentic-loop bounds (spec.md §4.11).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub max_iterations: u32,
    pub max_total_tokens: u64,
    pub default_max_output_tokens: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            max_total_tokens: 200_000,
            default_max_output_tokens: 4096,
        }
    }
}

/// Conversation-compaction behavior (spec.md §4.4, SPEC_FULL §4 "Tiered
/// compaction cost").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Fraction of the context window at which `maybe_compact` triggers.
    pub trigger_ratio: f64,
    /// Number of most-recent messages kept verbatim, uncompacted.
    pub tail_window: usize,
    /// Compaction count at/after which an LLM-generated summary replaces
    /// the deterministic extractor (open question in spec.md §9: kept
    /// configurable per the stated rationale).
    pub llm_summary_from_compaction: u32,
    /// Cap on error lines retained by the deterministic extractor.
    pub max_errors: usize,
    /// Cap on total key facts retained by the deterministic extractor.
    pub max_facts: usize,
    /// Bounded retries for the LLM-summary path before falling back.
    pub llm_retry_attempts: u32,
    pub llm_retry_base_delay_ms: u64,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            trigger_ratio: 0.75,
            tail_window: 6,
            llm_summary_from_compaction: 3,
            max_errors: 5,
            max_facts: 25,
            llm_retry_attempts: 3,
            llm_retry_base_delay_ms: 250,
        }
    }
}

/// Conversation buffer shape (spec.md §4.4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub max_tokens: u64,
    pub min_messages: usize,
    pub chars_per_token: f64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 180_000,
            min_messages: 2,
            chars_per_token: 4.0,
        }
    }
}

/// Aggregate config consumed across the workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreStackConfig {
    pub verify: VerifyPolicyConfig,
    pub autonomy: AutonomyBudgetsConfig,
    pub loop_config: LoopConfig,
    pub compaction: CompactionConfig,
    pub conversation: ConversationConfig,
}

#[cfg(test)]
#[path = "types.test.rs"]
mod tests;
