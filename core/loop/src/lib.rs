//! Agentic Loop (spec.md §4.11): the bounded model-call/tool-execution
//! iteration that produces an assistant turn's worth of artifacts. It never
//! mutates the workspace directly or applies a diff — tool execution and
//! diff application are the caller's concern.

mod driver;
mod sanitize;
mod types;

pub use driver::AgenticLoop;
pub use driver::RunRequest;
pub use types::LoopConfig;
pub use types::LoopResult;
pub use types::TerminationReason;
pub use types::ToolCallRecord;
