//! # Events: requests and task outcomes.
//!
//! The [`EventKind`] enum is closed and classifies events in two groups:
//! - **Requests**: something should happen (`RequestAuthentication`, `RequestConfig`,
//!   `RequestPollStart`, `RequestPollStop`)
//! - **Outcomes**: a task finished a unit of work (`*Succeeded`, `*Failed`)
//!
//! The [`Event`] struct carries the payload fields relevant for its kind. Events are
//! immutable once dispatched; the [`Store`](crate::Store) stamps `seq` at dispatch time.
//!
//! ## Ordering guarantees
//! `seq` is assigned by the store under its lock, so it is strictly increasing in
//! apply order. A freshly constructed event has `seq == 0`.
//!
//! ## Example
//! ```rust
//! use pollvisor::{Event, EventKind};
//!
//! let ev = Event::request_config(2);
//! assert_eq!(ev.kind, EventKind::RequestConfig);
//! assert_eq!(ev.report_id, Some(2));
//! assert_eq!(ev.seq, 0);
//! ```

use std::sync::Arc;

use crate::error::TaskError;
use crate::store::{ReportItem, TargetId, UserId};

/// Classification of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Authentication ===
    /// Resolve the current user.
    ///
    /// Sets:
    /// - `user` (optional): id to store as current user before resolving
    RequestAuthentication,

    /// Current user resolved.
    ///
    /// Sets:
    /// - `user`: resolved id
    /// - `authorized`: registry verdict
    AuthenticationSucceeded,

    /// Current user could not be resolved.
    ///
    /// Sets:
    /// - `error`
    AuthenticationFailed,

    // === Configuration ===
    /// Fetch the target list of a report.
    ///
    /// Sets:
    /// - `report_id`
    RequestConfig,

    /// Target list fetched.
    ///
    /// Sets:
    /// - `targets`
    /// - `title` (optional)
    ConfigFetchSucceeded,

    /// Target list could not be fetched.
    ///
    /// Sets:
    /// - `error`
    ConfigFetchFailed,

    // === Polling ===
    /// Start the polling loop.
    RequestPollStart,

    /// One report item fetched.
    ///
    /// Sets:
    /// - `item`
    ReportDataFetchSucceeded,

    /// Report item could not be fetched; the loop ends.
    ///
    /// Sets:
    /// - `error`
    ReportDataFetchFailed,

    /// Stop the polling loop.
    RequestPollStop,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::RequestAuthentication => "request-authentication",
            EventKind::AuthenticationSucceeded => "auth-succeeded",
            EventKind::AuthenticationFailed => "auth-failed",
            EventKind::RequestConfig => "request-config",
            EventKind::ConfigFetchSucceeded => "config-succeeded",
            EventKind::ConfigFetchFailed => "config-failed",
            EventKind::RequestPollStart => "poll-start",
            EventKind::ReportDataFetchSucceeded => "data-succeeded",
            EventKind::ReportDataFetchFailed => "data-failed",
            EventKind::RequestPollStop => "poll-stop",
        }
    }
}

/// Event record with optional payload.
///
/// - `seq`: dispatch sequence number (0 until dispatched)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Dispatch sequence number, strictly increasing in apply order.
    pub seq: u64,
    /// Event classification.
    pub kind: EventKind,

    /// User id (authentication request/outcome).
    pub user: Option<UserId>,
    /// Authorization verdict.
    pub authorized: Option<bool>,
    /// Requested report.
    pub report_id: Option<u64>,
    /// Poll targets from the configuration.
    pub targets: Option<Arc<[TargetId]>>,
    /// Report title from the configuration.
    pub title: Option<Arc<str>>,
    /// Fetched report item.
    pub item: Option<Arc<ReportItem>>,
    /// Failure carried by `*Failed` events.
    pub error: Option<TaskError>,
}

impl Event {
    /// Creates a new event of the given kind with an empty payload.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            kind,
            user: None,
            authorized: None,
            report_id: None,
            targets: None,
            title: None,
            item: None,
            error: None,
        }
    }

    /// `RequestAuthentication` reading the current user from the identity store.
    pub fn request_authentication() -> Self {
        Event::new(EventKind::RequestAuthentication)
    }

    /// `AuthenticationSucceeded { id, is_authorized }`.
    pub fn authentication_succeeded(id: impl Into<UserId>, authorized: bool) -> Self {
        let mut ev = Event::new(EventKind::AuthenticationSucceeded).with_user(id);
        ev.authorized = Some(authorized);
        ev
    }

    /// `AuthenticationFailed { error }`.
    pub fn authentication_failed(error: TaskError) -> Self {
        Event::new(EventKind::AuthenticationFailed).with_error(error)
    }

    /// `RequestConfig { report_id }`.
    pub fn request_config(report_id: u64) -> Self {
        let mut ev = Event::new(EventKind::RequestConfig);
        ev.report_id = Some(report_id);
        ev
    }

    /// `ConfigFetchSucceeded { targets }`.
    pub fn config_fetch_succeeded(targets: impl Into<Arc<[TargetId]>>) -> Self {
        let mut ev = Event::new(EventKind::ConfigFetchSucceeded);
        ev.targets = Some(targets.into());
        ev
    }

    /// `ConfigFetchFailed { error }`.
    pub fn config_fetch_failed(error: TaskError) -> Self {
        Event::new(EventKind::ConfigFetchFailed).with_error(error)
    }

    /// `RequestPollStart`.
    pub fn request_poll_start() -> Self {
        Event::new(EventKind::RequestPollStart)
    }

    /// `ReportDataFetchSucceeded { item }`.
    pub fn report_data_fetch_succeeded(item: ReportItem) -> Self {
        let mut ev = Event::new(EventKind::ReportDataFetchSucceeded);
        ev.item = Some(Arc::new(item));
        ev
    }

    /// `ReportDataFetchFailed { error }`.
    pub fn report_data_fetch_failed(error: TaskError) -> Self {
        Event::new(EventKind::ReportDataFetchFailed).with_error(error)
    }

    /// `RequestPollStop`.
    pub fn request_poll_stop() -> Self {
        Event::new(EventKind::RequestPollStop)
    }

    /// Attaches a user id.
    #[inline]
    pub fn with_user(mut self, user: impl Into<UserId>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Attaches a report title.
    #[inline]
    pub fn with_title(mut self, title: impl Into<Arc<str>>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attaches an error.
    #[inline]
    pub fn with_error(mut self, error: TaskError) -> Self {
        self.error = Some(error);
        self
    }

    #[inline]
    pub(crate) fn stamped(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }
}
