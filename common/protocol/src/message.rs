//! The conversation wire model (spec.md §3 "Conversation").
//!
//! Ordered sequence of messages `(role, content)`. `content` is either a
//! plain string or an ordered sequence of typed blocks. Kept here (rather
//! than inside `corestack-conversation`) because the token counter, tool
//! catalog, and agentic loop crates all need to read the same shape without
//! depending on the history buffer that owns it.

use serde::Deserialize;
use serde::Serialize;

/// Message author (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One block of message content (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Image {
        /// Opaque base64-encoded blob.
        data: String,
        media_type: String,
    },
    ToolUse {
        tool_use_id: String,
        tool_name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        output: String,
        success: bool,
    },
}

/// Either a plain string or an ordered sequence of blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Content {
    pub fn as_blocks(&self) -> Vec<ContentBlock> {
        match self {
            Self::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
            Self::Blocks(blocks) => blocks.clone(),
        }
    }

    /// Character count of the textual content, ignoring structured blocks'
    /// non-text payload (used by the character-based token fallback).
    pub fn char_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Blocks(blocks) => blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => text.chars().count(),
                    ContentBlock::ToolUse { input, .. } => input.to_string().chars().count(),
                    ContentBlock::ToolResult { output, .. } => output.chars().count(),
                    ContentBlock::Image { .. } => 0,
                })
                .sum(),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// One conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    pub fn user(content: impl Into<Content>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn tool_use_ids(&self) -> Vec<String> {
        self.content
            .as_blocks()
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { tool_use_id, .. } => Some(tool_use_id),
                _ => None,
            })
            .collect()
    }

    pub fn tool_result_ids(&self) -> Vec<String> {
        self.content
            .as_blocks()
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "message.test.rs"]
mod tests;
