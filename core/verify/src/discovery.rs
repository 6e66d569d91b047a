//! Verify command discovery chain (SPEC_FULL §4 "Verify command discovery
//! detail"): package manifest scripts, then Makefile targets, then the
//! configured fallback list. The first source to yield anything wins.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use corestack_protocol::FileSystemAdapter;
use regex::Regex;

use crate::types::CommandSource;
use crate::types::DiscoveredCommand;

#[allow(clippy::expect_used)]
static MAKE_TARGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9_.-]*)\s*:(?!=)").expect("valid regex"));

async fn discover_package_manifest_scripts(fs: &dyn FileSystemAdapter, workspace_root: &Path) -> Vec<DiscoveredCommand> {
    let manifest_path = workspace_root.join("package.json");
    if !fs.exists(&manifest_path).await {
        return Vec::new();
    }
    let Ok(bytes) = fs.read_file(&manifest_path).await else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return Vec::new();
    };
    let Some(scripts) = value.get("scripts").and_then(|s| s.as_object()) else {
        return Vec::new();
    };
    scripts
        .iter()
        .filter_map(|(name, command)| {
            command.as_str().map(|command| DiscoveredCommand {
                name: name.clone(),
                command: command.to_string(),
                source: CommandSource::PackageManifestScript,
            })
        })
        .collect()
}

async fn discover_makefile_targets(fs: &dyn FileSystemAdapter, workspace_root: &Path) -> Vec<DiscoveredCommand> {
    let makefile_path = workspace_root.join("Makefile");
    if !fs.exists(&makefile_path).await {
        return Vec::new();
    }
    let Ok(bytes) = fs.read_file(&makefile_path).await else {
        return Vec::new();
    };
    let text = String::from_utf8_lossy(&bytes);

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for line in text.lines() {
        let Some(captures) = MAKE_TARGET_RE.captures(line) else {
            continue;
        };
        let Some(name) = captures.get(1) else {
            continue;
        };
        let name = name.as_str().to_string();
        if name == "PHONY" || name.starts_with('.') || !seen.insert(name.clone()) {
            continue;
        }
        targets.push(DiscoveredCommand {
            command: format!("make {name}"),
            name,
            source: CommandSource::MakefileTarget,
        });
    }
    targets
}

fn discover_fallback(fallback_commands: &[String]) -> Vec<DiscoveredCommand> {
    fallback_commands
        .iter()
        .map(|entry| DiscoveredCommand {
            name: entry.clone(),
            command: entry.clone(),
            source: CommandSource::ConfiguredFallback,
        })
        .collect()
}

/// Package manifest scripts, then Makefile targets, then the configured
/// fallback list (spec.md §4.13 step 4).
pub async fn discover_commands(fs: &dyn FileSystemAdapter, workspace_root: &Path, fallback_commands: &[String]) -> Vec<DiscoveredCommand> {
    let from_manifest = discover_package_manifest_scripts(fs, workspace_root).await;
    if !from_manifest.is_empty() {
        return from_manifest;
    }
    let from_makefile = discover_makefile_targets(fs, workspace_root).await;
    if !from_makefile.is_empty() {
        return from_makefile;
    }
    discover_fallback(fallback_commands)
}

#[cfg(test)]
#[path = "discovery.test.rs"]
mod tests;
