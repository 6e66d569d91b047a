//! A scripted [`ModelClient`] for agentic-loop and repair-orchestrator
//! tests: callers queue up responses and the fake returns them in order.

use async_trait::async_trait;
use corestack_protocol::CreateMessageRequest;
use corestack_protocol::CreateMessageResponse;
use corestack_protocol::ModelClient;
use tokio::sync::Mutex;

/// Replays a fixed sequence of responses, one per `create_message` call.
/// Calling past the end of the script returns an error, which exercises
/// the loop's transport-failure path.
pub struct ScriptedModelClient {
    responses: Mutex<Vec<Result<CreateMessageResponse, String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedModelClient {
    /// Build a client that replays `responses` in order (first call gets
    /// `responses[0]`, and so on).
    pub fn new(responses: Vec<CreateMessageResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).rev().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Build a client whose script is a mix of successes and transport
    /// failures, in the order supplied.
    pub fn scripted(responses: Vec<Result<CreateMessageResponse, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The models requested across every `create_message` call, in order.
    pub async fn requested_models(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn create_message(&self, request: CreateMessageRequest<'_>) -> Result<CreateMessageResponse, String> {
        self.calls.lock().await.push(request.model.to_string());
        let mut responses = self.responses.lock().await;
        responses.pop().unwrap_or_else(|| Err("scripted responses exhausted".to_string()))
    }
}
