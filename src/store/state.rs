//! # Application state tree.
//!
//! Three independent subtrees, each owned by its own reducer. Subtrees are held
//! behind `Arc` and replaced whole; a reducer that does not match an event hands
//! back the same `Arc`, so unchanged subtrees are shared between snapshots.

use std::sync::Arc;

use serde_json::Value;

use crate::error::TaskError;

/// Identifier of a user in the authorization registry.
pub type UserId = String;

/// Identifier of one pollable remote data item.
pub type TargetId = String;

/// One fetched report item.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportItem {
    /// Target the item was fetched from.
    pub target: TargetId,
    /// Decoded payload.
    pub data: Value,
}

/// Authentication subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub loading: bool,
    pub error: Option<TaskError>,
    pub identity: Option<UserId>,
    pub is_authorized: bool,
}

/// Configuration subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportConfigState {
    pub loading: bool,
    pub error: Option<TaskError>,
    /// Report requested by the last `RequestConfig`.
    pub report_id: Option<u64>,
    pub title: Option<Arc<str>>,
    pub targets: Option<Arc<[TargetId]>>,
}

/// Polled data subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDataState {
    pub loading: bool,
    pub error: Option<TaskError>,
    /// Last fetched item.
    pub data: Option<Arc<ReportItem>>,
    /// Number of successful data fetches; never decreases.
    pub fetch_count: u64,
    pub is_polling: bool,
}

/// Whole application state.
///
/// Cloning is cheap: three `Arc` bumps.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub user: Arc<UserState>,
    pub report_config: Arc<ReportConfigState>,
    pub report_data: Arc<ReportDataState>,
}

impl AppState {
    /// Targets from the configuration subtree, empty when none were fetched yet.
    pub fn targets(&self) -> Arc<[TargetId]> {
        self.report_config
            .targets
            .clone()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }
}
