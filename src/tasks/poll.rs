//! # Poll task: the report data loop.
//!
//! One run of this task is one polling loop instance. It lives until it is
//! cancelled (stop request, shutdown) or a fetch fails.
//!
//! ```text
//! loop {
//!   ├─► targets = state.report_config.targets
//!   ├─► target  = targets[random 0..len]     (empty → EmptyTargets)
//!   ├─► fetch(target_url(target))           ◄── cancellation point
//!   │     ├─ Ok  → ReportDataFetchSucceeded { item }
//!   │     └─ Err → return Err(DataFetch)
//!   └─► sleep(poll_interval)                ◄── cancellation point
//! }
//!
//! on failure: ReportDataFetchFailed { error } → RequestPollStop
//! ```
//!
//! ## Rules
//! - Iterations are sequential: the outcome of one fetch is applied before the
//!   next fetch starts.
//! - Failures are not retried; a new `RequestPollStart` is needed.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::TaskError;
use crate::events::Event;
use crate::ports::{Body, FetchError, FetchRef};
use crate::store::{ReportItem, TargetId};

use super::task::{Task, TaskContext};

/// Picks a target uniformly at random.
///
/// Returns [`TaskError::EmptyTargets`] for an empty slice.
pub fn pick_target<'a, R: Rng + ?Sized>(
    targets: &'a [TargetId],
    rng: &mut R,
) -> Result<&'a TargetId, TaskError> {
    if targets.is_empty() {
        return Err(TaskError::EmptyTargets);
    }
    Ok(&targets[rng.random_range(0..targets.len())])
}

/// Decodes a data response: the `data` field of an object if present, else the
/// whole document.
pub fn decode_item(target: &str, body: &Body) -> Result<ReportItem, FetchError> {
    let doc: Value = body.json()?;
    let data = match doc {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(ReportItem {
        target: target.to_string(),
        data,
    })
}

/// Task running the polling loop.
pub struct PollTask {
    fetch: FetchRef,
    cfg: Arc<Config>,
}

impl PollTask {
    pub fn new(fetch: FetchRef, cfg: Arc<Config>) -> Self {
        Self { fetch, cfg }
    }
}

#[async_trait]
impl Task for PollTask {
    fn name(&self) -> &'static str {
        "poll"
    }

    async fn run(&self, _trigger: &Event, ctx: &TaskContext) -> Result<(), TaskError> {
        info!("polling started");
        let mut iteration: u64 = 0;

        loop {
            let targets = ctx.state().targets();
            let target = {
                let mut rng = rand::rng();
                pick_target(&targets, &mut rng)?.clone()
            };
            iteration += 1;
            debug!(%target, iteration, "polling target");

            let url = self.cfg.target_url(&target);
            let body = ctx
                .guard(self.fetch.fetch(&url))
                .await?
                .map_err(|e| TaskError::data(&target, e))?;
            let item = decode_item(&target, &body).map_err(|e| TaskError::data(&target, e))?;

            ctx.emit(Event::report_data_fetch_succeeded(item))?;
            ctx.sleep(self.cfg.poll_interval).await?;
        }
    }

    fn on_failure(&self, err: TaskError) -> Vec<Event> {
        vec![
            Event::report_data_fetch_failed(err),
            Event::request_poll_stop(),
        ]
    }
}
