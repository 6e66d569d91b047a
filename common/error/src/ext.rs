//! A lightweight error wrapper used at component boundaries.

use std::error::Error as StdError;
use std::fmt;

use crate::status_code::StatusCategory;
use crate::status_code::StatusCode;

/// A boxed, type-erased source error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A message plus a [`StatusCode`] and optional source, with no variant of
/// its own to match on.
///
/// Component-local `snafu` enums convert into [`crate::CoreError`] at crate
/// boundaries; `PlainError` is the cheaper cousin for call sites that only
/// need a status code and a human-readable message, not a typed variant.
#[derive(Debug)]
pub struct PlainError {
    message: String,
    status_code: StatusCode,
    source: Option<BoxError>,
}

impl PlainError {
    /// Create a new error with no source.
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            status_code,
            source: None,
        }
    }

    /// Create a new error wrapping a source error.
    pub fn with_source(
        message: impl Into<String>,
        status_code: StatusCode,
        source: BoxError,
    ) -> Self {
        Self {
            message: message.into(),
            status_code,
            source: Some(source),
        }
    }

    /// The status code this error was classified under.
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Whether the caller may retry the operation that produced this error.
    pub fn is_retryable(&self) -> bool {
        self.status_code.is_retryable()
    }

    /// A message safe to surface outside the process.
    ///
    /// Errors shaped by the caller's own input (`Input`, `Auth`, `Config`)
    /// surface their message verbatim; everything else collapses to a bare
    /// status code so internal detail never reaches an end user.
    pub fn output_msg(&self) -> String {
        match self.status_code.category() {
            StatusCategory::Input | StatusCategory::Auth | StatusCategory::Config => {
                self.message.clone()
            }
            _ => format!("Internal error: {}", self.status_code as i32),
        }
    }
}

impl fmt::Display for PlainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for PlainError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}

impl crate::ErrorExt for PlainError {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Wrap any standard error as a [`PlainError`] carrying `status_code`,
/// taking the source's `Display` output as the message.
pub fn boxed(err: impl StdError + Send + Sync + 'static, status_code: StatusCode) -> PlainError {
    let message = err.to_string();
    PlainError::with_source(message, status_code, Box::new(err))
}

#[cfg(test)]
#[path = "ext.test.rs"]
mod tests;
