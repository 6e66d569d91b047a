//! The agentic loop (spec.md §4.11): bounded iteration over
//! model-call → tool-execution → tool-result, producing artifacts only —
//! it never applies a diff itself.

use std::sync::Arc;

use corestack_config::LoopConfig;
use corestack_context::validate_context_fits;
use corestack_context::validate_context_fits_sync;
use corestack_conversation::ConversationHistory;
use corestack_event_log::EventBus;
use corestack_protocol::Content;
use corestack_protocol::ContentBlock;
use corestack_protocol::CreateMessageRequest;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::Message;
use corestack_protocol::Mode;
use corestack_protocol::ModelClient;
use corestack_protocol::Stage;
use corestack_protocol::StopReason;
use corestack_protocol::TokenCounter;
use corestack_tools_api::Tool;
use corestack_tools_api::ToolProvider;
use tracing::info;
use tracing::warn;

use crate::sanitize::sanitize_for_log;
use crate::types::LoopResult;
use crate::types::TerminationReason;
use crate::types::ToolCallRecord;

fn tool_to_schema(tool: &Tool) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.input_schema,
    })
}

/// One call to [`AgenticLoop::run`]'s worth of configuration: the model
/// client, tool provider, history buffer, and model parameters.
pub struct RunRequest<'a> {
    pub client: &'a dyn ModelClient,
    pub tool_provider: &'a dyn ToolProvider,
    pub history: &'a mut ConversationHistory,
    pub system: Option<&'a str>,
    pub model: &'a str,
    pub max_tokens: u32,
    pub token_counter: Option<&'a dyn TokenCounter>,
    pub on_text: Option<&'a dyn Fn(&str)>,
}

/// Drives the bounded tool-calling loop for one task/mode/stage context.
pub struct AgenticLoop {
    bus: Arc<EventBus>,
    config: LoopConfig,
    tools: Vec<Tool>,
    task_id: String,
    mode: Mode,
    stage: Stage,
}

impl AgenticLoop {
    pub fn new(bus: Arc<EventBus>, config: LoopConfig, tools: Vec<Tool>, task_id: impl Into<String>, mode: Mode, stage: Stage) -> Self {
        Self {
            bus,
            config,
            tools,
            task_id: task_id.into(),
            mode,
            stage,
        }
    }

    async fn emit(&self, payload: EventPayload) {
        let event = Event::new(self.task_id.clone(), self.mode, self.stage, payload);
        if let Err(error) = self.bus.publish(event).await {
            warn!(task_id = %self.task_id, %error, "failed to persist loop event");
        }
    }

    /// Ensure `history` fits the model's context window before the call,
    /// trimming it (via the injected counter when available) if it doesn't
    /// (spec.md §4.11 step 1).
    async fn ensure_fits(&self, request: &mut RunRequest<'_>, tool_schemas: &[serde_json::Value]) {
        let messages = request.history.get_messages();
        let fits = match request.token_counter {
            Some(counter) => {
                match validate_context_fits(counter, &messages, request.system, Some(tool_schemas), request.model).await {
                    Ok(fit) => fit.fits,
                    Err(error) => {
                        warn!(%error, "token counter failed during fit check, falling back to sync estimate");
                        validate_context_fits_sync(&messages, tool_schemas.len(), request.model).fits
                    }
                }
            }
            None => validate_context_fits_sync(&messages, tool_schemas.len(), request.model).fits,
        };
        if fits {
            return;
        }
        match request.token_counter {
            Some(counter) => request.history.trim_async(counter, request.model).await,
            None => request.history.trim(),
        }
    }

    /// Run the loop to completion or termination (spec.md §4.11).
    pub async fn run(&self, mut request: RunRequest<'_>) -> LoopResult {
        let tool_schemas: Vec<serde_json::Value> = self.tools.iter().map(tool_to_schema).collect();

        let mut iteration = 0u32;
        let mut total_input_tokens = 0u64;
        let mut total_output_tokens = 0u64;
        let mut final_text = String::new();
        let mut tool_calls = Vec::new();
        let mut transcript = Vec::new();

        loop {
            iteration += 1;
            if iteration > self.config.max_iterations {
                return LoopResult {
                    reason: TerminationReason::MaxIterations,
                    final_text,
                    iterations: iteration - 1,
                    total_input_tokens,
                    total_output_tokens,
                    tool_calls,
                    transcript,
                };
            }

            self.ensure_fits(&mut request, &tool_schemas).await;

            let messages = request.history.get_messages();
            let model_request = CreateMessageRequest {
                model: request.model,
                max_tokens: request.max_tokens,
                system: request.system,
                messages: &messages,
                tools: if tool_schemas.is_empty() { None } else { Some(&tool_schemas) },
            };

            let response = match request.client.create_message(model_request).await {
                Ok(response) => response,
                Err(error) => {
                    warn!(%error, iteration, "model call failed");
                    return LoopResult {
                        reason: TerminationReason::Error,
                        final_text,
                        iterations: iteration,
                        total_input_tokens,
                        total_output_tokens,
                        tool_calls,
                        transcript,
                    };
                }
            };

            total_input_tokens += response.input_tokens.unwrap_or(0);
            total_output_tokens += response.output_tokens.unwrap_or(0);

            let mut tool_use_blocks = Vec::new();
            for block in &response.content {
                match block {
                    ContentBlock::Text { text } => {
                        final_text.push_str(text);
                        if let Some(on_text) = request.on_text {
                            on_text(text);
                        }
                    }
                    ContentBlock::ToolUse { .. } => tool_use_blocks.push(block.clone()),
                    _ => {}
                }
                transcript.push(block.clone());
            }

            request.history.append(Message::assistant(Content::Blocks(response.content.clone())));

            if total_input_tokens + total_output_tokens > self.config.max_total_tokens {
                info!(iteration, total_input_tokens, total_output_tokens, "loop stopped: max_total_tokens exceeded");
                return LoopResult {
                    reason: TerminationReason::MaxTokens,
                    final_text,
                    iterations: iteration,
                    total_input_tokens,
                    total_output_tokens,
                    tool_calls,
                    transcript,
                };
            }

            if !matches!(response.stop_reason, StopReason::ToolUse) || tool_use_blocks.is_empty() {
                let reason = if matches!(response.stop_reason, StopReason::MaxTokens) {
                    TerminationReason::MaxTokens
                } else {
                    TerminationReason::EndTurn
                };
                return LoopResult {
                    reason,
                    final_text,
                    iterations: iteration,
                    total_input_tokens,
                    total_output_tokens,
                    tool_calls,
                    transcript,
                };
            }

            let mut result_blocks = Vec::with_capacity(tool_use_blocks.len());
            for block in tool_use_blocks {
                let ContentBlock::ToolUse { tool_use_id, tool_name, input } = block else {
                    continue;
                };
                let sanitized_input = sanitize_for_log(&input);
                self.emit(EventPayload::ToolStart {
                    tool_use_id: tool_use_id.clone(),
                    tool_name: tool_name.clone(),
                    sanitized_input,
                })
                .await;

                let outcome = request.tool_provider.execute_tool(&tool_name, input).await;

                self.emit(EventPayload::ToolEnd {
                    tool_use_id: tool_use_id.clone(),
                    success: outcome.success,
                    output_len: outcome.output.chars().count(),
                })
                .await;

                tool_calls.push(ToolCallRecord {
                    tool_use_id: tool_use_id.clone(),
                    tool_name,
                    success: outcome.success,
                    output_len: outcome.output.chars().count(),
                });

                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id,
                    output: outcome.output,
                    success: outcome.success,
                });
            }

            request.history.append(Message::user(Content::Blocks(result_blocks)));
        }
    }
}

#[cfg(test)]
#[path = "driver.test.rs"]
mod tests;
