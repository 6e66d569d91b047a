//! Tool execution provider interface (spec.md §6).
//!
//! Dynamic tool-provider dispatch is polymorphism over this one capability
//! (spec.md §9 redesign flag); the provider itself doesn't know about
//! categories — [`crate::name_to_category`] owns that classification.

use async_trait::async_trait;

/// The outcome of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolExecutionResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            output: format!("Error: {error}"),
            error: Some(error),
        }
    }
}

/// Consumed by the agentic loop to execute one `tool_use` block.
/// Implementations must be side-effect-safe within a single invocation
/// (spec.md §6).
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn execute_tool(&self, name: &str, input: serde_json::Value) -> ToolExecutionResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_prefixes_output_with_error() {
        let result = ToolExecutionResult::failed("file not found");
        assert!(!result.success);
        assert_eq!(result.output, "Error: file not found");
        assert_eq!(result.error.as_deref(), Some("file not found"));
    }

    #[test]
    fn ok_carries_no_error() {
        let result = ToolExecutionResult::ok("done");
        assert!(result.success);
        assert_eq!(result.output, "done");
        assert!(result.error.is_none());
    }
}
