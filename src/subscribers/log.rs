//! # Logging observer.
//!
//! [`LogWriter`] renders every event as one line and emits it through
//! `tracing` at `info` (failures at `warn`) under the `pollvisor::events` target.
//!
//! ## Output format
//! ```text
//! #1 [request-authentication] user="alice"
//! #2 [auth-succeeded] user="alice" authorized=true
//! #3 [request-config] report=42
//! #4 [config-succeeded] targets=3 title="Blocks"
//! #5 [poll-start]
//! #6 [data-succeeded] target="t1"
//! #7 [data-failed] err="data fetch for \"t2\" failed: transport error: refused"
//! #8 [poll-stop]
//! ```

use std::fmt::Write;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event logging observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders one event as a log line.
    pub fn render(e: &Event) -> String {
        let mut line = format!("#{} [{}]", e.seq, e.kind.as_label());

        // Writing into a String cannot fail.
        match e.kind {
            EventKind::RequestAuthentication => {
                if let Some(user) = &e.user {
                    let _ = write!(line, " user={user:?}");
                }
            }
            EventKind::AuthenticationSucceeded => {
                let _ = write!(
                    line,
                    " user={:?} authorized={}",
                    e.user.as_deref().unwrap_or("unknown"),
                    e.authorized.unwrap_or(false)
                );
            }
            EventKind::RequestConfig => {
                if let Some(id) = e.report_id {
                    let _ = write!(line, " report={id}");
                }
            }
            EventKind::ConfigFetchSucceeded => {
                let _ = write!(line, " targets={}", e.targets.as_ref().map_or(0, |t| t.len()));
                if let Some(title) = &e.title {
                    let _ = write!(line, " title={title:?}");
                }
            }
            EventKind::ReportDataFetchSucceeded => {
                if let Some(item) = &e.item {
                    let _ = write!(line, " target={:?}", item.target);
                }
            }
            EventKind::AuthenticationFailed
            | EventKind::ConfigFetchFailed
            | EventKind::ReportDataFetchFailed => {
                if let Some(err) = &e.error {
                    let _ = write!(line, " err={:?}", err.to_string());
                }
            }
            EventKind::RequestPollStart | EventKind::RequestPollStop => {}
        }
        line
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let line = Self::render(e);
        if e.error.is_some() {
            warn!(target: "pollvisor::events", "{line}");
        } else {
            info!(target: "pollvisor::events", "{line}");
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
