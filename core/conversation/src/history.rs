//! The mutable ordered message buffer (spec.md §4.4).

use async_trait::async_trait;
use corestack_config::CompactionConfig;
use corestack_config::ConversationConfig;
use corestack_protocol::CountTokensRequest;
use corestack_protocol::Message;
use corestack_protocol::Role;
use corestack_protocol::TokenCounter;
use corestack_protocol::estimate_tokens_sync;
use tracing::debug;
use tracing::warn;

use crate::error::ConversationError;
use crate::error::conversation_error::DeserializeSnafu;
use crate::error::conversation_error::SerializeSnafu;
use crate::extractor::extract_key_facts;
use crate::extractor::render_summary;
use snafu::ResultExt;

/// Injected LLM summarizer for compactions at/after
/// `CompactionConfig::llm_summary_from_compaction`. Errors fall back to the
/// deterministic extractor after `llm_retry_attempts` retries.
#[async_trait]
pub trait SummaryClient: Send + Sync {
    async fn summarize(&self, messages: &[Message]) -> Result<String, String>;
}

/// A mutable ordered buffer of conversation messages.
pub struct ConversationHistory {
    messages: Vec<Message>,
    config: ConversationConfig,
    compaction: CompactionConfig,
    compaction_count: u32,
}

impl ConversationHistory {
    pub fn new(config: ConversationConfig, compaction: CompactionConfig) -> Self {
        Self {
            messages: Vec::new(),
            config,
            compaction,
            compaction_count: 0,
        }
    }

    /// Append one message. `Message` is plain owned data, so taking it by
    /// value already prevents a caller's later mutation from leaking in.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// A defensive copy of the buffer.
    pub fn get_messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn compaction_count(&self) -> u32 {
        self.compaction_count
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Char-count-based estimate using the configured `chars_per_token`.
    pub fn estimate_tokens(&self) -> u64 {
        let chars: usize = self.messages.iter().map(|m| m.content.char_len()).sum();
        (chars as f64 / self.config.chars_per_token).ceil() as u64
    }

    /// Per-block heuristic estimate (prose/code/tool_use/tool_result/image
    /// ratios), shared with the token-counter crate (spec.md §4.5).
    pub fn estimate_tokens_improved(&self) -> u64 {
        estimate_tokens_sync(&self.messages, 0)
    }

    /// Remove oldest messages until the estimate is within `max_tokens`
    /// while keeping at least `min_messages`; then, if the head is not
    /// `user`, keep removing it (invariant C1 / P9).
    pub fn trim(&mut self) {
        while self.messages.len() > self.config.min_messages && self.estimate_tokens() > self.config.max_tokens {
            self.messages.remove(0);
        }
        self.enforce_user_head();
    }

    /// Same semantics as [`trim`](Self::trim) but consults an injected
    /// async counter; falls back to the sync estimate on counter error.
    pub async fn trim_async(&mut self, counter: &dyn TokenCounter, model: &str) {
        loop {
            if self.messages.len() <= self.config.min_messages {
                break;
            }
            let estimated = match counter
                .count_tokens(CountTokensRequest {
                    messages: &self.messages,
                    system: None,
                    tools: None,
                    model,
                })
                .await
            {
                Ok(result) => result.input_tokens,
                Err(error) => {
                    warn!(error, "token counter failed, falling back to sync estimate");
                    self.estimate_tokens()
                }
            };
            if estimated <= self.config.max_tokens {
                break;
            }
            self.messages.remove(0);
        }
        self.enforce_user_head();
    }

    fn enforce_user_head(&mut self) {
        while !self.messages.is_empty() && !matches!(self.messages[0].role, Role::User) {
            self.messages.remove(0);
        }
    }

    /// Trigger compaction once the buffer reaches `trigger_ratio` of
    /// `window`. Splits at a tail of `tail_window` most-recent messages,
    /// summarizes the prefix (deterministic extractor below
    /// `llm_summary_from_compaction`, otherwise an LLM client with bounded
    /// retries and fallback to the extractor), and replaces the prefix with
    /// a synthesized user message plus a neutral assistant acknowledgement.
    pub async fn maybe_compact(&mut self, window: u64, llm_client: Option<&dyn SummaryClient>) -> bool {
        let estimated = self.estimate_tokens();
        let threshold = (window as f64 * self.compaction.trigger_ratio) as u64;
        if estimated < threshold {
            return false;
        }
        if self.messages.len() <= self.compaction.tail_window {
            return false;
        }

        let split = self.messages.len() - self.compaction.tail_window;
        let prefix: Vec<Message> = self.messages.drain(0..split).collect();

        let use_llm = self.compaction_count + 1 >= self.compaction.llm_summary_from_compaction;
        let summary = match (use_llm, llm_client) {
            (true, Some(client)) => self.summarize_with_retries(client, &prefix).await,
            _ => render_summary(&extract_key_facts(&prefix, &self.compaction)),
        };

        self.messages.insert(0, Message::assistant("Acknowledged — continuing with the above context."));
        self.messages.insert(0, Message::user(summary));
        self.compaction_count += 1;
        self.enforce_user_head();

        debug!(
            compaction_count = self.compaction_count,
            prefix_messages = split,
            "compacted conversation history"
        );
        true
    }

    async fn summarize_with_retries(&self, client: &dyn SummaryClient, prefix: &[Message]) -> String {
        let mut delay_ms = self.compaction.llm_retry_base_delay_ms;
        for attempt in 0..self.compaction.llm_retry_attempts {
            match client.summarize(prefix).await {
                Ok(summary) => return summary,
                Err(error) => {
                    warn!(attempt, error, "LLM summary attempt failed");
                    if attempt + 1 < self.compaction.llm_retry_attempts {
                        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                        delay_ms *= 2;
                    }
                }
            }
        }
        warn!("LLM summary exhausted retries, falling back to key-fact extractor");
        render_summary(&extract_key_facts(prefix, &self.compaction))
    }

    pub fn to_json(&self) -> Result<String, ConversationError> {
        serde_json::to_string(&SerializedHistory {
            messages: &self.messages,
            config: &self.config,
            compaction: &self.compaction,
            compaction_count: self.compaction_count,
        })
        .context(SerializeSnafu)
    }

    pub fn from_json(json: &str) -> Result<Self, ConversationError> {
        let owned: OwnedSerializedHistory = serde_json::from_str(json).context(DeserializeSnafu)?;
        Ok(Self {
            messages: owned.messages,
            config: owned.config,
            compaction: owned.compaction,
            compaction_count: owned.compaction_count,
        })
    }
}

#[derive(serde::Serialize)]
struct SerializedHistory<'a> {
    messages: &'a [Message],
    config: &'a ConversationConfig,
    compaction: &'a CompactionConfig,
    compaction_count: u32,
}

#[derive(serde::Deserialize)]
struct OwnedSerializedHistory {
    messages: Vec<Message>,
    config: ConversationConfig,
    compaction: CompactionConfig,
    compaction_count: u32,
}

#[cfg(test)]
#[path = "history.test.rs"]
mod tests;
