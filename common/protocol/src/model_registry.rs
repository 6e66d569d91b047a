//! Static model-alias resolution (spec.md §3 "Model resolution").
//!
//! A user-facing alias like `"haiku"` resolves to a canonical model id.
//! Aliases that don't resolve fall back to a configured default; the caller
//! (`corestack-loop`) is responsible for turning that fallback into a
//! `model_fallback_used` event — this module only computes the mapping.

/// A resolved model alias: the canonical id plus whether resolution fell
/// back to the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAlias {
    pub canonical: String,
    pub fell_back: bool,
}

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const ALIASES: &[(&str, &str)] = &[
    ("haiku", "claude-haiku-4-5-20251001"),
    ("sonnet", "claude-sonnet-4-20250514"),
    ("opus", "claude-opus-4-20250514"),
    ("claude-haiku-4-5-20251001", "claude-haiku-4-5-20251001"),
    ("claude-sonnet-4-20250514", "claude-sonnet-4-20250514"),
    ("claude-opus-4-20250514", "claude-opus-4-20250514"),
];

/// Resolve a user-facing alias to its canonical model identifier.
///
/// Known aliases (including canonical ids passed through unchanged)
/// resolve directly; anything else resolves to [`DEFAULT_MODEL`] with
/// `fell_back = true`.
pub fn resolve_model(alias: &str) -> ModelAlias {
    match ALIASES.iter().find(|(a, _)| *a == alias) {
        Some((_, canonical)) => ModelAlias {
            canonical: canonical.to_string(),
            fell_back: false,
        },
        None => ModelAlias {
            canonical: DEFAULT_MODEL.to_string(),
            fell_back: true,
        },
    }
}

/// The default model used when an alias fails to resolve.
pub fn default_model() -> &'static str {
    DEFAULT_MODEL
}

#[cfg(test)]
#[path = "model_registry.test.rs"]
mod tests;
