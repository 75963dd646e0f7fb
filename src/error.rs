//! Error types used by the pollvisor engine and its tasks.
//!
//! This module defines two main error enums:
//!
//! - [`TaskError`]: failures of individual tasks; always converted into a terminal
//!   failure event and recorded in the matching state subtree.
//! - [`RuntimeError`]: errors raised by the engine itself during shutdown.
//!
//! Both types provide `as_label` for logs and `as_message` for humans.
//! Failures of the fetch port live in [`crate::ports::FetchError`].

use std::time::Duration;
use thiserror::Error;

use crate::ports::FetchError;

/// # Errors produced by task execution.
///
/// Every variant except [`TaskError::Canceled`] ends up inside a failure event
/// (`AuthenticationFailed`, `ConfigFetchFailed`, `ReportDataFetchFailed`) and is
/// stored in the state tree, hence `Clone + PartialEq`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Current user could not be resolved (identity store empty or unavailable).
    #[error("cannot resolve current user: {error}")]
    AuthResolution {
        /// The underlying error message.
        error: String,
    },

    /// Target list could not be fetched or decoded.
    #[error("config fetch failed: {error}")]
    ConfigFetch {
        /// The underlying error message.
        error: String,
    },

    /// One report item could not be fetched or decoded.
    #[error("data fetch for {target:?} failed: {error}")]
    DataFetch {
        /// Target that was being polled.
        target: String,
        /// The underlying error message.
        error: String,
    },

    /// Polling started with zero configured targets.
    #[error("no targets configured")]
    EmptyTargets,

    /// Task was cancelled (superseded or stopped). Never emitted as an event.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pollvisor::TaskError;
    ///
    /// assert_eq!(TaskError::EmptyTargets.as_label(), "empty_targets");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::AuthResolution { .. } => "auth_resolution",
            TaskError::ConfigFetch { .. } => "config_fetch",
            TaskError::DataFetch { .. } => "data_fetch",
            TaskError::EmptyTargets => "empty_targets",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::AuthResolution { error } => format!("auth: {error}"),
            TaskError::ConfigFetch { error } => format!("config: {error}"),
            TaskError::DataFetch { target, error } => format!("data[{target}]: {error}"),
            TaskError::EmptyTargets => "no targets configured".to_string(),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Wraps a fetch failure of the configuration endpoint.
    pub fn config(err: FetchError) -> Self {
        TaskError::ConfigFetch {
            error: err.to_string(),
        }
    }

    /// Wraps a fetch failure of one poll target.
    pub fn data(target: &str, err: FetchError) -> Self {
        TaskError::DataFetch {
            target: target.to_string(),
            error: err.to_string(),
        }
    }
}

/// # Errors produced by the engine runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some tasks did not join in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the tasks that did not finish in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
