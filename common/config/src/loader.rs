//! JSONC config loading with environment-variable overrides
//! (SPEC_FULL §3.3).
//!
//! The *mechanism* (file format, precedence) is in scope; the *source* of
//! CLI flags is an external collaborator's job (spec.md §1 Non-goals).

use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::error::config_error::EnvOverrideSnafu;
use crate::error::config_error::IoSnafu;
use crate::error::config_error::ParseSnafu;
use crate::types::CoreStackConfig;
use crate::types::VerifyMode;
use snafu::ResultExt;

/// Prefix every environment-variable override shares, e.g.
/// `CORESTACK_VERIFY__MODE=auto`.
pub const ENV_PREFIX: &str = "CORESTACK_";

/// Parse a JSONC document into [`CoreStackConfig`], defaulting any field the
/// document omits.
pub fn parse(jsonc: &str) -> Result<CoreStackConfig, ConfigError> {
    let value: serde_json::Value =
        jsonc_parser::parse_to_serde_value(jsonc, &jsonc_parser::ParseOptions::default())
            .ok()
            .flatten()
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

    let deserializer = &mut serde_json::Deserializer::from_str(&value.to_string());
    serde_path_to_error::deserialize(deserializer).context(ParseSnafu {
        path: "<in-memory>".to_string(),
    })
}

/// Load a config file from disk, falling back to an all-defaults config
/// when the file does not exist.
pub fn load_from_file(path: &Path) -> Result<CoreStackConfig, ConfigError> {
    if !path.exists() {
        return Ok(CoreStackConfig::default());
    }
    let contents = std::fs::read_to_string(path).context(IoSnafu {
        path: path.display().to_string(),
    })?;
    parse(&contents)
}

/// Apply `CORESTACK_<SECTION>__<FIELD>` environment overrides on top of an
/// already-loaded config. Overrides take precedence over the file (higher
/// precedence, per SPEC_FULL §3.3).
pub fn apply_env_overrides(
    config: &mut CoreStackConfig,
    env: &HashMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in env {
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let Some((section, field)) = rest.split_once("__") else {
            continue;
        };
        apply_one(config, section, field, value, key)?;
    }
    Ok(())
}

fn apply_one(
    config: &mut CoreStackConfig,
    section: &str,
    field: &str,
    value: &str,
    full_key: &str,
) -> Result<(), ConfigError> {
    let invalid = |message: String| {
        EnvOverrideSnafu {
            key: full_key.to_string(),
            value: value.to_string(),
            message,
        }
        .build()
    };
    match (section.to_ascii_lowercase().as_str(), field.to_ascii_lowercase().as_str()) {
        ("verify", "mode") => {
            config.verify.mode = match value.to_ascii_lowercase().as_str() {
                "off" => VerifyMode::Off,
                "prompt" => VerifyMode::Prompt,
                "auto" => VerifyMode::Auto,
                other => return Err(invalid(format!("unknown verify mode '{other}'"))),
            };
        }
        ("verify", "timeout_secs") => {
            config.verify.timeout_secs = value
                .parse()
                .map_err(|_| invalid("expected an integer".to_string()))?;
        }
        ("autonomy", "max_iterations") => {
            config.autonomy.max_iterations = value
                .parse()
                .map_err(|_| invalid("expected an integer".to_string()))?;
        }
        ("autonomy", "max_wall_time_secs") => {
            config.autonomy.max_wall_time_secs = value
                .parse()
                .map_err(|_| invalid("expected an integer".to_string()))?;
        }
        ("autonomy", "max_tool_calls") => {
            config.autonomy.max_tool_calls = value
                .parse()
                .map_err(|_| invalid("expected an integer".to_string()))?;
        }
        ("loop_config", "max_iterations") => {
            config.loop_config.max_iterations = value
                .parse()
                .map_err(|_| invalid("expected an integer".to_string()))?;
        }
        ("loop_config", "max_total_tokens") => {
            config.loop_config.max_total_tokens = value
                .parse()
                .map_err(|_| invalid("expected an integer".to_string()))?;
        }
        ("compaction", "trigger_ratio") => {
            config.compaction.trigger_ratio = value
                .parse()
                .map_err(|_| invalid("expected a float".to_string()))?;
        }
        ("compaction", "llm_summary_from_compaction") => {
            config.compaction.llm_summary_from_compaction = value
                .parse()
                .map_err(|_| invalid("expected an integer".to_string()))?;
        }
        _ => {
            // Unknown keys under the prefix are ignored rather than
            // rejected: the prefix is shared by future fields this crate
            // doesn't know about yet.
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "loader.test.rs"]
mod tests;
