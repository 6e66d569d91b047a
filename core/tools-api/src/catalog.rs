//! The closed enumeration of six tools and the filterable catalog view
//! (spec.md §4.6).

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

/// Read/write/exec categorization used to build read-only catalogs and to
/// drive the autonomy controller's tools-approved precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Read,
    Write,
    Exec,
}

/// A JSON-schema-like input schema: `type=object` plus a properties map
/// and a required-keys list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub schema_type: &'static str,
    pub properties: BTreeMap<&'static str, serde_json::Value>,
    pub required: Vec<&'static str>,
}

/// One entry in the closed tool enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: &'static str,
    pub category: ToolCategory,
    pub description: &'static str,
    pub input_schema: ToolSchema,
}

fn string_prop(description: &str) -> serde_json::Value {
    serde_json::json!({ "type": "string", "description": description })
}

fn schema(properties: &[(&'static str, &str)], required: &[&'static str]) -> ToolSchema {
    ToolSchema {
        schema_type: "object",
        properties: properties.iter().map(|(key, desc)| (*key, string_prop(desc))).collect(),
        required: required.to_vec(),
    }
}

/// The six tools, in the order the spec's required-inputs table lists
/// them (spec.md §4.6).
pub fn all_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "read_file",
            category: ToolCategory::Read,
            description: "Read the contents of a file in the workspace.",
            input_schema: schema(&[("path", "Workspace-relative path to read.")], &["path"]),
        },
        Tool {
            name: "search_files",
            category: ToolCategory::Read,
            description: "Search workspace files for a text or pattern query.",
            input_schema: schema(&[("query", "Text or pattern to search for.")], &["query"]),
        },
        Tool {
            name: "list_directory",
            category: ToolCategory::Read,
            description: "List the entries of a workspace directory.",
            input_schema: schema(&[("path", "Workspace-relative directory path; defaults to the workspace root.")], &[]),
        },
        Tool {
            name: "write_file",
            category: ToolCategory::Write,
            description: "Create or overwrite a file with the given content.",
            input_schema: schema(
                &[("path", "Workspace-relative path to write."), ("content", "Full file content.")],
                &["path", "content"],
            ),
        },
        Tool {
            name: "edit_file",
            category: ToolCategory::Write,
            description: "Replace one exact occurrence of old_text with new_text in a file.",
            input_schema: schema(
                &[
                    ("path", "Workspace-relative path to edit."),
                    ("old_text", "Exact text to replace."),
                    ("new_text", "Replacement text."),
                ],
                &["path", "old_text", "new_text"],
            ),
        },
        Tool {
            name: "run_command",
            category: ToolCategory::Exec,
            description: "Run a shell command in the workspace.",
            input_schema: schema(&[("command", "Shell command to execute.")], &["command"]),
        },
    ]
}

/// Unknown tool names default to `Read` (spec.md §4.6 `name_to_category`):
/// the conservative category for an unrecognized request.
pub fn name_to_category(name: &str) -> ToolCategory {
    all_tools()
        .into_iter()
        .find(|tool| tool.name == name)
        .map(|tool| tool.category)
        .unwrap_or(ToolCategory::Read)
}

/// Filter options for [`build_catalog`].
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub read_only: bool,
    pub include: Option<HashSet<String>>,
    pub exclude: Option<HashSet<String>>,
}

/// Build a filtered view of the tool catalog (spec.md §4.6).
///
/// Starts from every tool; `read_only` restricts to the read category;
/// `include` intersects with the named set; `exclude` subtracts the named
/// set. An unknown name in `include` simply contributes nothing to the
/// intersection rather than erroring.
pub fn build_catalog(filter: &CatalogFilter) -> Vec<Tool> {
    let mut tools = all_tools();
    if filter.read_only {
        tools.retain(|tool| tool.category == ToolCategory::Read);
    }
    if let Some(include) = &filter.include {
        tools.retain(|tool| include.contains(tool.name));
    }
    if let Some(exclude) = &filter.exclude {
        tools.retain(|tool| !exclude.contains(tool.name));
    }
    tools
}

#[cfg(test)]
#[path = "catalog.test.rs"]
mod tests;
