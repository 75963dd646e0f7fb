//! # Config task.
//!
//! Fetches the target list of a report and arms polling:
//!
//! ```text
//! RequestConfig { report_id }
//!   └─► fetch(config_url(report_id))
//!         ├─ Ok(body)  → ConfigFetchSucceeded { targets, title } → RequestPollStart
//!         └─ Err(e)    → ConfigFetchFailed { ConfigFetch }        (polling not armed)
//! ```
//!
//! Accepted payloads:
//! - `["t0", "t1"]`
//! - `{ "title": "bitcoin", "targets": ["t0", "t1"] }`
//! - `{ "title": "bitcoin" }` → the title is the only target

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::error::TaskError;
use crate::events::Event;
use crate::ports::{Body, FetchError, FetchRef};
use crate::store::TargetId;

use super::task::{Task, TaskContext};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConfigPayload {
    List(Vec<TargetId>),
    Object {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        targets: Option<Vec<TargetId>>,
    },
}

/// Decoded report configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub title: Option<String>,
    pub targets: Vec<TargetId>,
}

impl ReportConfig {
    /// Decodes a config response body.
    pub fn decode(body: &Body) -> Result<Self, FetchError> {
        let cfg = match body.json::<ConfigPayload>()? {
            ConfigPayload::List(targets) => ReportConfig {
                title: None,
                targets,
            },
            ConfigPayload::Object {
                title,
                targets: Some(targets),
            } => ReportConfig { title, targets },
            ConfigPayload::Object {
                title,
                targets: None,
            } => ReportConfig {
                targets: title.iter().cloned().collect(),
                title,
            },
        };
        Ok(cfg)
    }
}

/// Task fetching the poll targets.
pub struct ConfigTask {
    fetch: FetchRef,
    cfg: Arc<Config>,
}

impl ConfigTask {
    pub fn new(fetch: FetchRef, cfg: Arc<Config>) -> Self {
        Self { fetch, cfg }
    }
}

#[async_trait]
impl Task for ConfigTask {
    fn name(&self) -> &'static str {
        "config"
    }

    async fn run(&self, trigger: &Event, ctx: &TaskContext) -> Result<(), TaskError> {
        let url = self.cfg.config_url(trigger.report_id.unwrap_or_default());
        let body = ctx
            .guard(self.fetch.fetch(&url))
            .await?
            .map_err(TaskError::config)?;
        let report = ReportConfig::decode(&body).map_err(TaskError::config)?;

        let mut ev = Event::config_fetch_succeeded(report.targets);
        if let Some(title) = report.title {
            ev = ev.with_title(title);
        }
        ctx.emit(ev)?;
        ctx.emit(Event::request_poll_start())?;
        Ok(())
    }

    fn on_failure(&self, err: TaskError) -> Vec<Event> {
        vec![Event::config_fetch_failed(err)]
    }
}
