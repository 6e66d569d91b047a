//! A canned [`ToolProvider`] for agentic-loop tests.

use std::collections::HashMap;

use async_trait::async_trait;
use corestack_tools_api::ToolExecutionResult;
use corestack_tools_api::ToolProvider;
use tokio::sync::Mutex;

/// Returns a fixed result per tool name (falling back to a generic success
/// for any name not registered), and records every invocation seen.
#[derive(Default)]
pub struct CannedToolProvider {
    results: HashMap<String, ToolExecutionResult>,
    invocations: Mutex<Vec<(String, serde_json::Value)>>,
}

impl CannedToolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_result(mut self, name: impl Into<String>, result: ToolExecutionResult) -> Self {
        self.results.insert(name.into(), result);
        self
    }

    pub async fn invocations(&self) -> Vec<(String, serde_json::Value)> {
        self.invocations.lock().await.clone()
    }
}

#[async_trait]
impl ToolProvider for CannedToolProvider {
    async fn execute_tool(&self, name: &str, input: serde_json::Value) -> ToolExecutionResult {
        self.invocations.lock().await.push((name.to_string(), input));
        self.results.get(name).cloned().unwrap_or_else(|| ToolExecutionResult::ok("ok"))
    }
}
