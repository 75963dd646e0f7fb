//! # Poll supervisor: race the polling loop against stop.
//!
//! Sequential supervisor for the [`PollTask`](crate::tasks::PollTask):
//!
//! ```text
//! loop {
//!   ├─► wait for RequestPollStart(seq = n)         (Idle)
//!   ├─► token = runtime.child_token()
//!   ├─► store.cancel_on(RequestPollStop, n, token)
//!   └─► race {                                     (Polling)
//!         run_once(poll, start, ctx)   → loop ended by failure
//!         RequestPollStop on the feed  → token.cancel()
//!       }
//! }
//! ```
//!
//! ## Rules
//! - Only one `RequestPollStart` is serviced at a time; starts applied while a
//!   loop is alive are ignored (single-flight by construction). A start applied
//!   after the loop was stopped, but seen before it finished unwinding, is kept
//!   and serviced next.
//! - A stop is applied and cancels the loop's token in the same critical
//!   section, so no data event from the stopped loop is applied after it.
//! - The loop is driven inline; when the race ends the loop future is dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::runner::run_once;
use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::store::Store;
use crate::tasks::{TaskContext, TaskRef};

/// Why a polling loop instance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Stop request won the race.
    Stopped,
    /// The loop failed and stopped itself.
    Failed,
    /// Engine shutdown.
    Shutdown,
}

/// Supervisor of the polling loop.
pub struct PollSupervisor {
    task: TaskRef,
    store: Arc<Store>,
}

impl PollSupervisor {
    pub fn new(task: TaskRef, store: Arc<Store>) -> Self {
        Self { task, store }
    }

    /// Services `RequestPollStart` events until `runtime` is cancelled.
    ///
    /// `rx` is a [`Store::listen`] feed of `RequestPollStart` and `RequestPollStop`.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Event>, runtime: CancellationToken) {
        let mut pending: Option<Event> = None;

        loop {
            let start = match pending.take() {
                Some(ev) => ev,
                None => tokio::select! {
                    _ = runtime.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Some(ev) if ev.kind == EventKind::RequestPollStart => ev,
                        Some(_) => continue,
                        None => break,
                    }
                },
            };

            let (exit, next) = self.race(start, &mut rx, &runtime).await;
            info!(?exit, "polling ended");
            if exit == LoopExit::Shutdown {
                break;
            }
            pending = next;
        }
        debug!("poll supervisor stopped");
    }

    async fn race(
        &self,
        start: Event,
        rx: &mut mpsc::UnboundedReceiver<Event>,
        runtime: &CancellationToken,
    ) -> (LoopExit, Option<Event>) {
        let token = runtime.child_token();
        self.store
            .cancel_on(EventKind::RequestPollStop, start.seq, token.clone());
        let ctx = TaskContext::new(Arc::clone(&self.store), token.clone());

        let poll = run_once(self.task.as_ref(), &start, &ctx);
        tokio::pin!(poll);
        let mut next_start = None;
        let mut closed = false;

        let exit = loop {
            tokio::select! {
                res = &mut poll => {
                    break match res {
                        _ if runtime.is_cancelled() => LoopExit::Shutdown,
                        Err(TaskError::Canceled) => LoopExit::Stopped,
                        _ => LoopExit::Failed,
                    };
                }
                msg = rx.recv(), if !closed => match msg {
                    Some(ev) if ev.kind == EventKind::RequestPollStop && ev.seq > start.seq => {
                        // Usually already cancelled by the store trigger.
                        token.cancel();
                    }
                    // A start applied after this loop's stop belongs to the next loop.
                    Some(ev) if ev.kind == EventKind::RequestPollStart && token.is_cancelled() => {
                        next_start = Some(ev);
                    }
                    Some(ev) if ev.kind == EventKind::RequestPollStart => {
                        debug!(seq = ev.seq, "already polling; start ignored");
                    }
                    Some(_) => {}
                    None => {
                        closed = true;
                        token.cancel();
                    }
                }
            }
        };

        token.cancel();
        (exit, next_start)
    }
}
