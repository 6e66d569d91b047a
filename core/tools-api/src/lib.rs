//! Tool Catalog and the tool-execution provider interface (spec.md §4.6,
//! §6 "Tool execution provider interface").

pub mod catalog;
pub mod provider;

pub use catalog::CatalogFilter;
pub use catalog::Tool;
pub use catalog::ToolCategory;
pub use catalog::ToolSchema;
pub use catalog::all_tools;
pub use catalog::build_catalog;
pub use catalog::name_to_category;
pub use provider::ToolExecutionResult;
pub use provider::ToolProvider;
