//! Loop configuration and result types (spec.md §4.11).

use corestack_protocol::ContentBlock;
pub use corestack_config::LoopConfig;

/// Why a `run` call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The model returned a stop reason other than `tool_use` and had no
    /// pending tool calls.
    EndTurn,
    /// `max_iterations` was reached without the loop reaching `EndTurn`.
    MaxIterations,
    /// Cumulative input/output tokens crossed `max_total_tokens`.
    MaxTokens,
    /// A transport-level error from the model client ended the loop.
    Error,
}

/// One recorded tool invocation, kept for the caller's inspection
/// (spec.md §4.11 step 6, "recorded in `toolCalls`").
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub tool_use_id: String,
    pub tool_name: String,
    pub success: bool,
    pub output_len: usize,
}

/// The outcome of running the loop to completion or termination.
#[derive(Debug, Clone)]
pub struct LoopResult {
    pub reason: TerminationReason,
    pub final_text: String,
    pub iterations: u32,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub tool_calls: Vec<ToolCallRecord>,
    pub transcript: Vec<ContentBlock>,
}
