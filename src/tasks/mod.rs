//! # Tasks: units of I/O triggered by events.
//!
//! This module provides:
//! - [`Task`] - trait for event-triggered, cancelable tasks
//! - [`TaskContext`] - cancellation token + guarded emission into the store
//! - [`AuthTask`] - resolves the current user against an [`AuthRegistry`]
//! - [`ConfigTask`] - fetches the poll targets and arms polling
//! - [`PollTask`] - the report data loop
//!
//! ```text
//! RequestAuthentication ──► AuthTask   ──► AuthenticationSucceeded | AuthenticationFailed
//! RequestConfig         ──► ConfigTask ──► ConfigFetchSucceeded + RequestPollStart
//!                                          | ConfigFetchFailed
//! RequestPollStart      ──► PollTask   ──► ReportDataFetchSucceeded*
//!                                          [ReportDataFetchFailed + RequestPollStop]
//! ```

mod auth;
mod poll;
mod report_config;
mod task;

pub use auth::{Access, AuthRegistry, AuthTask};
pub use poll::{PollTask, decode_item, pick_target};
pub use report_config::{ConfigTask, ReportConfig};
pub use task::{Task, TaskContext, TaskRef};
