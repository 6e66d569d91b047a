//! Deterministic key-fact extractor used for the first two compactions of
//! a task, and as the fallback when an LLM summary client errors out
//! (spec.md §4.4).

use std::sync::LazyLock;

use corestack_config::CompactionConfig;
use corestack_protocol::ContentBlock;
use corestack_protocol::Message;
use regex::Regex;

#[allow(clippy::expect_used)]
static FILE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(`'\"])((?:/|\.{1,2}/)?(?:[\w.-]+/)+[\w.-]+\.\w+)").expect("valid regex"));
#[allow(clippy::expect_used)]
static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\$\s+(.+)$").expect("valid regex"));
#[allow(clippy::expect_used)]
static ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(error|failed|exception|panic)\b.*").expect("valid regex"));
#[allow(clippy::expect_used)]
static DECISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(decided|chose|will use|going with)\b.*").expect("valid regex"));

/// A single fact pulled deterministically from conversation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFact {
    FilePath(String),
    Command(String),
    Error(String),
    Decision(String),
}

/// Extract a summary-worthy set of facts from `messages`, in encounter
/// order, capped at `config.max_facts` total and `config.max_errors` errors.
pub fn extract_key_facts(messages: &[Message], config: &CompactionConfig) -> Vec<KeyFact> {
    let mut files = Vec::new();
    let mut commands = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    let mut decisions = Vec::new();

    for message in messages {
        for block in message.content.as_blocks() {
            let text = match &block {
                ContentBlock::Text { text } => text.clone(),
                ContentBlock::ToolResult { output, .. } => output.clone(),
                ContentBlock::ToolUse { input, .. } => input.to_string(),
                ContentBlock::Image { .. } => continue,
            };

            for line in text.lines() {
                if let Some(captures) = FILE_PATH_RE.captures(line) {
                    if let Some(path) = captures.get(1) {
                        let path = path.as_str().to_string();
                        if !files.contains(&path) {
                            files.push(path);
                        }
                    }
                }
                if let Some(captures) = COMMAND_RE.captures(line) {
                    if let Some(command) = captures.get(1) {
                        commands.push(command.as_str().to_string());
                    }
                }
                if ERROR_RE.is_match(line) {
                    errors.push(line.trim().to_string());
                }
                if DECISION_RE.is_match(line) {
                    decisions.push(line.trim().to_string());
                }
            }
        }
    }

    // Keep only the most recent errors.
    if errors.len() > config.max_errors {
        errors.drain(0..errors.len() - config.max_errors);
    }

    let mut facts = Vec::new();
    facts.extend(files.into_iter().map(KeyFact::FilePath));
    facts.extend(commands.into_iter().map(KeyFact::Command));
    facts.extend(errors.into_iter().map(KeyFact::Error));
    facts.extend(decisions.into_iter().map(KeyFact::Decision));
    facts.truncate(config.max_facts);
    facts
}

/// Render facts into the synthesized prefix-summary user message.
pub fn render_summary(facts: &[KeyFact]) -> String {
    if facts.is_empty() {
        return "No salient facts were extracted from the prior conversation.".to_string();
    }

    let mut sections: Vec<(&str, Vec<&str>)> = vec![
        ("Files touched", Vec::new()),
        ("Commands run", Vec::new()),
        ("Errors encountered", Vec::new()),
        ("Decisions made", Vec::new()),
    ];

    for fact in facts {
        match fact {
            KeyFact::FilePath(path) => sections[0].1.push(path),
            KeyFact::Command(command) => sections[1].1.push(command),
            KeyFact::Error(error) => sections[2].1.push(error),
            KeyFact::Decision(decision) => sections[3].1.push(decision),
        }
    }

    let mut out = String::from("Summary of earlier conversation:\n");
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{title}:\n"));
        for item in items {
            out.push_str(&format!("- {item}\n"));
        }
    }
    out
}

#[cfg(test)]
#[path = "extractor.test.rs"]
mod tests;
