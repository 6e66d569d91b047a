//! The model client interface consumed by the agentic loop and by
//! conversation compaction's LLM-summary path (spec.md §6).

use async_trait::async_trait;

use crate::message::ContentBlock;
use crate::message::Message;

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    Other,
}

/// A request to `create_message`.
#[derive(Debug, Clone)]
pub struct CreateMessageRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: Option<&'a str>,
    pub messages: &'a [Message],
    pub tools: Option<&'a [serde_json::Value]>,
}

/// The model's response.
#[derive(Debug, Clone)]
pub struct CreateMessageResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// One streamed delta: either a text fragment or the closing signal.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    TextDelta(String),
    Complete(CreateMessageResponse),
}

/// Consumed provider interface for model calls (spec.md §6).
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn create_message(
        &self,
        request: CreateMessageRequest<'_>,
    ) -> Result<CreateMessageResponse, String>;

    /// Streaming variant; default implementation calls the non-streaming
    /// path and emits its text as a single delta followed by completion.
    async fn create_message_streaming(
        &self,
        request: CreateMessageRequest<'_>,
        on_event: &(dyn Fn(StreamEvent) + Send + Sync),
    ) -> Result<CreateMessageResponse, String> {
        let response = self.create_message(request).await?;
        for block in &response.content {
            if let ContentBlock::Text { text } = block {
                on_event(StreamEvent::TextDelta(text.clone()));
            }
        }
        on_event(StreamEvent::Complete(response.clone()));
        Ok(response)
    }
}
