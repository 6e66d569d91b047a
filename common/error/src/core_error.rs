//! Top-level error aggregator.
//!
//! Component-local errors (`EventStoreError`, `CheckpointError`, `DiffError`,
//! ...) are `snafu` enums living in their own crates. At a crate boundary
//! they convert into [`CoreError`], which keeps only what a caller one or
//! two layers removed actually needs: a [`StatusCode`] to branch on and a
//! message/debug chain to display or log.

use std::error::Error as StdError;
use std::fmt;

use crate::ErrorExt;
use crate::StatusCode;

/// Any component error, reduced to a status code plus the originating
/// error's `Display`/`Debug` output, captured at conversion time.
pub struct CoreError {
    status_code: StatusCode,
    display: String,
    debug: String,
}

impl CoreError {
    /// The status code of the originating component error.
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Whether the originating error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.status_code.is_retryable()
    }
}

impl<E> From<E> for CoreError
where
    E: ErrorExt + 'static,
{
    fn from(err: E) -> Self {
        Self {
            status_code: err.status_code(),
            display: err.to_string(),
            debug: format!("{err:?}"),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}

impl fmt::Debug for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.debug)
    }
}

impl StdError for CoreError {}

/// Result type used at module boundaries that return [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
#[path = "core_error.test.rs"]
mod tests;
