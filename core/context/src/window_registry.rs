//! Per-model context window / reserved-output registry and the context-fit
//! check built on top of it (spec.md §4.5).

use corestack_protocol::CountTokensRequest;
use corestack_protocol::Message;
use corestack_protocol::TokenCounter;
use corestack_protocol::estimate_tokens_sync;

const DEFAULT_WINDOW: u64 = 200_000;
const DEFAULT_RESERVED_OUTPUT: u64 = 8_192;

const WINDOWS: &[(&str, u64, u64)] = &[
    ("claude-haiku-4-5-20251001", 200_000, 8_192),
    ("claude-sonnet-4-20250514", 200_000, 8_192),
    ("claude-opus-4-20250514", 200_000, 8_192),
];

fn window_for(model: &str) -> (u64, u64) {
    WINDOWS
        .iter()
        .find(|(name, _, _)| *name == model)
        .map(|(_, window, reserved)| (*window, *reserved))
        .unwrap_or((DEFAULT_WINDOW, DEFAULT_RESERVED_OUTPUT))
}

/// Result of a context-fit check: whether `estimated` tokens fit in the
/// model's window after reserving space for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextFit {
    pub fits: bool,
    pub estimated: u64,
    pub window: u64,
    pub available: u64,
    pub reserved_output: u64,
    pub overflow: u64,
}

fn fit_from(estimated: u64, window: u64, reserved_output: u64) -> ContextFit {
    let available = window.saturating_sub(reserved_output);
    let fits = estimated <= available;
    let overflow = estimated.saturating_sub(available);
    ContextFit {
        fits,
        estimated,
        window,
        available,
        reserved_output,
        overflow,
    }
}

/// Sync fit check using the shared character-based estimate.
pub fn validate_context_fits_sync(messages: &[Message], tool_schema_count: usize, model: &str) -> ContextFit {
    let (window, reserved_output) = window_for(model);
    let estimated = estimate_tokens_sync(messages, tool_schema_count);
    fit_from(estimated, window, reserved_output)
}

/// Async fit check using an injected [`TokenCounter`]; the caller supplies
/// `system`/`tools` payloads alongside the window-bearing `model`.
pub async fn validate_context_fits(
    counter: &dyn TokenCounter,
    messages: &[Message],
    system: Option<&str>,
    tools: Option<&[serde_json::Value]>,
    model: &str,
) -> std::result::Result<ContextFit, String> {
    let (window, reserved_output) = window_for(model);
    let result = counter
        .count_tokens(CountTokensRequest {
            messages,
            system,
            tools,
            model,
        })
        .await?;
    Ok(fit_from(result.input_tokens, window, reserved_output))
}

#[cfg(test)]
#[path = "window_registry.test.rs"]
mod tests;
