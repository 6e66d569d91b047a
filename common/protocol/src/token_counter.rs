//! The injectable token-counting interface (spec.md §4.5).
//!
//! Defined here rather than in `corestack-context` (which owns the
//! character-based default implementation) so that `corestack-conversation`
//! can accept an injected counter for `trim_async` without depending on a
//! higher-layer crate.

use async_trait::async_trait;

use crate::message::Content;
use crate::message::ContentBlock;
use crate::message::Message;

/// Input to a token-count request.
#[derive(Debug, Clone)]
pub struct CountTokensRequest<'a> {
    pub messages: &'a [Message],
    pub system: Option<&'a str>,
    pub tools: Option<&'a [serde_json::Value]>,
    pub model: &'a str,
}

/// Result of a token-count request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountTokensResult {
    pub input_tokens: u64,
    pub is_estimate: bool,
}

/// An injectable token counter. The core provides a character-based
/// implementation that always reports `is_estimate = true`; a provider SDK
/// may supply a real one backed by the model's own tokenizer.
#[async_trait]
pub trait TokenCounter: Send + Sync {
    async fn count_tokens(&self, request: CountTokensRequest<'_>) -> Result<CountTokensResult, String>;
}

const PER_MESSAGE_OVERHEAD: f64 = 4.0;
const PROSE_CHARS_PER_TOKEN: f64 = 4.0;
const CODE_CHARS_PER_TOKEN: f64 = 3.2;
const TOOL_USE_CHARS_PER_TOKEN: f64 = 3.0;
const TOOL_RESULT_CHARS_PER_TOKEN: f64 = 3.5;
const IMAGE_TOKENS: f64 = 1600.0;
const TOOL_SCHEMA_TOKENS: f64 = 300.0;

const CODE_INDICATOR_MIN_MATCHES: usize = 3;

/// Heuristic classification of prose vs. code, used to pick a
/// chars-per-token ratio for `text` blocks (spec.md §4.5).
///
/// Text under 20 characters is never classified as code: a true/false
/// one-liner is too short to reliably show three independent signals.
fn looks_like_code(text: &str) -> bool {
    if text.len() < 20 {
        return false;
    }
    let indicators = [
        text.lines().any(|line| line.trim_end().ends_with('{') || line.trim_end().ends_with('}')),
        text.contains("=>"),
        text.contains("import ") || text.contains("export "),
        text.contains("fn ") || text.contains("function ") || text.contains("class ") || text.contains("def "),
        text.contains(';'),
        ["if ", "for ", "while ", "match ", "return "].iter().any(|kw| text.contains(kw)),
    ];
    indicators.iter().filter(|matched| **matched).count() >= CODE_INDICATOR_MIN_MATCHES
}

/// Character-count-based token estimate for one content block
/// (spec.md §4.5's per-block-type table).
fn estimate_block_tokens(block: &ContentBlock) -> f64 {
    match block {
        ContentBlock::Text { text } => {
            let ratio = if looks_like_code(text) {
                CODE_CHARS_PER_TOKEN
            } else {
                PROSE_CHARS_PER_TOKEN
            };
            text.chars().count() as f64 / ratio
        }
        ContentBlock::ToolUse { input, .. } => input.to_string().chars().count() as f64 / TOOL_USE_CHARS_PER_TOKEN,
        ContentBlock::ToolResult { output, .. } => output.chars().count() as f64 / TOOL_RESULT_CHARS_PER_TOKEN,
        ContentBlock::Image { .. } => IMAGE_TOKENS,
    }
}

/// The synchronous character-based fallback: per-message overhead plus a
/// per-block-type heuristic, with a fixed cost per declared tool schema
/// (spec.md §4.5).
pub fn estimate_tokens_sync(messages: &[Message], tool_schema_count: usize) -> u64 {
    let mut total = tool_schema_count as f64 * TOOL_SCHEMA_TOKENS;
    for message in messages {
        total += PER_MESSAGE_OVERHEAD;
        match &message.content {
            Content::Text(text) => total += estimate_block_tokens(&ContentBlock::Text { text: text.clone() }),
            Content::Blocks(blocks) => {
                for block in blocks {
                    total += estimate_block_tokens(block);
                }
            }
        }
    }
    total.ceil().max(0.0) as u64
}

#[cfg(test)]
#[path = "token_counter.test.rs"]
mod tests;
