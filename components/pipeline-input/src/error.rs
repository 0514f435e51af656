//! Error types used by inputs, conditions and the shutdown controller.
//!
//! - [`InputError`] — raised while constructing an input, returned to the caller.
//! - [`ConditionError`] — raised while constructing a condition.
//! - [`TimeoutError`] — returned by `wait_for_close` when the deadline elapses first.
//!
//! Errors that happen inside a running input worker are never returned, they
//! end that worker and are only visible through logs and metrics.

// External crates
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// # Errors produced while constructing an input.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum InputError {
    /// A `read_until` input was configured without an input to wrap.
    #[error("cannot create read_until input without a child")]
    MissingChild,

    /// The wrapped input could not be constructed.
    #[error("failed to create input '{kind}': {source}")]
    Child {
        /// Type name of the wrapped input.
        kind: &'static str,
        /// Why the wrapped input failed.
        #[source]
        source: Box<InputError>,
    },

    /// The condition could not be constructed.
    #[error("failed to create condition '{kind}': {source}")]
    Condition {
        /// Type name of the condition.
        kind: &'static str,
        /// Why the condition failed.
        #[source]
        source: ConditionError,
    },

    /// A file backed input could not open its file.
    #[error("failed to open '{path}': {source}")]
    Open {
        /// Configured path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Inputs spawn their worker on the current tokio runtime.
    #[error("inputs must be created from within a tokio runtime")]
    Runtime,
}

impl InputError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            InputError::MissingChild => "input_missing_child",
            InputError::Child { .. } => "input_child_failed",
            InputError::Condition { .. } => "input_condition_failed",
            InputError::Open { .. } => "input_open_failed",
            InputError::Runtime => "input_no_runtime",
        }
    }
}

/// # Errors produced while constructing a condition.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConditionError {
    /// The `content` condition does not know the configured operator.
    #[error("content operator not recognised: {0}")]
    UnknownOperator(String),

    /// A `regexp_*` operator argument failed to compile.
    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    /// A child of a `not`/`and`/`or` condition failed to construct.
    #[error("failed to create child condition '{kind}': {source}")]
    Child {
        /// Type name of the child condition.
        kind: &'static str,
        /// Why the child failed.
        #[source]
        source: Box<ConditionError>,
    },
}

/// Returned when a close confirmation does not arrive before the deadline.
/// Never fatal, waiting again is always safe.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("timed out after {timeout:?}")]
pub struct TimeoutError {
    /// The deadline that elapsed.
    pub timeout: Duration,
}
