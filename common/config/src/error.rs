//! Config-loading errors (SPEC_FULL §3.2: component errors convert into
//! `corestack_error::CoreError` at crate boundaries).

use corestack_error::ErrorExt;
use corestack_error::Location;
use corestack_error::StatusCode;
use corestack_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ConfigError {
    #[snafu(display("failed to read config file {path}"))]
    Io {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to parse config at {path}"))]
    Parse {
        path: String,
        source: serde_path_to_error::Error<serde_json::Error>,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid config value: {message}"))]
    Validation {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid env override {key}={value}: {message}"))]
    EnvOverride {
        key: String,
        value: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for ConfigError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Io { .. } => StatusCode::IoError,
            Self::Parse { .. } => StatusCode::InvalidConfig,
            Self::Validation { .. } => StatusCode::InvalidConfig,
            Self::EnvOverride { .. } => StatusCode::InvalidConfig,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
