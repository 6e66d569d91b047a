//! The core's character-based [`TokenCounter`] (spec.md §4.5): no real
//! tokenizer, always reports `is_estimate = true`.

use async_trait::async_trait;
use corestack_protocol::CountTokensRequest;
use corestack_protocol::CountTokensResult;
use corestack_protocol::TokenCounter;
use corestack_protocol::estimate_tokens_sync;

#[derive(Debug, Clone, Copy, Default)]
pub struct CharCountTokenCounter;

#[async_trait]
impl TokenCounter for CharCountTokenCounter {
    async fn count_tokens(&self, request: CountTokensRequest<'_>) -> Result<CountTokensResult, String> {
        let tool_schema_count = request.tools.map(|tools| tools.len()).unwrap_or(0);
        let input_tokens = estimate_tokens_sync(request.messages, tool_schema_count);
        Ok(CountTokensResult {
            input_tokens,
            is_estimate: true,
        })
    }
}

#[cfg(test)]
#[path = "counter.test.rs"]
mod tests;
