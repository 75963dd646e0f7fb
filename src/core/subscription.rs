//! # Latest-wins subscription.
//!
//! Maps one triggering [`EventKind`] to a [`Task`]. Every matching event starts a
//! fresh run; the run started for the previous occurrence is cancelled first.
//!
//! ## Architecture
//! ```text
//! store.listen([K]) ──► listener
//!           ├─► K(seq = n) ──► cancel + join previous run
//!           │                ├─► token = runtime.child_token()
//!           │                ├─► store.cancel_on(K, n, token)
//!           │                └─► spawn run_once(task, ev, ctx)
//!           └─► runtime cancelled / feed closed ──► cancel + join current, exit
//! ```
//!
//! ## Rules
//! - At most one run is alive per subscription.
//! - Triggers arrive on a lossless store feed, so every applied `K` gets a run
//!   (or is superseded by a later one).
//! - The store trigger cancels a run the moment the next `K` is applied, before
//!   this listener even sees it, so a superseded run never emits after its
//!   successor's request.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::runner::run_once;
use crate::events::{Event, EventKind};
use crate::store::Store;
use crate::tasks::{TaskContext, TaskRef};

/// Handle to an in-flight run.
struct Handle {
    join: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Handle {
    async fn cancel_and_join(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            warn!(error = %e, "task run panicked");
        }
    }
}

/// Latest-wins subscription of one event kind to one task.
pub struct LatestWins {
    kind: EventKind,
    task: TaskRef,
    store: Arc<Store>,
}

impl LatestWins {
    pub fn new(kind: EventKind, task: TaskRef, store: Arc<Store>) -> Self {
        Self { kind, task, store }
    }

    /// Runs the listener until `runtime` is cancelled or the bus closes.
    ///
    /// `rx` must come from [`Store::listen`] for this kind, taken before the first
    /// trigger can be dispatched.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Event>, runtime: CancellationToken) {
        let mut current: Option<Handle> = None;

        loop {
            let ev = tokio::select! {
                _ = runtime.cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(ev) if ev.kind == self.kind => ev,
                    Some(_) => continue,
                    None => break,
                }
            };

            if let Some(prev) = current.take() {
                debug!(task = self.task.name(), seq = ev.seq, "superseding previous run");
                prev.cancel_and_join().await;
            }
            current = Some(self.start(ev, &runtime));
        }

        if let Some(prev) = current.take() {
            prev.cancel_and_join().await;
        }
        debug!(task = self.task.name(), "subscription stopped");
    }

    fn start(&self, ev: Event, runtime: &CancellationToken) -> Handle {
        let token = runtime.child_token();
        self.store.cancel_on(self.kind, ev.seq, token.clone());

        let ctx = TaskContext::new(Arc::clone(&self.store), token.clone());
        let task = Arc::clone(&self.task);
        let join = tokio::spawn(async move {
            let _ = run_once(task.as_ref(), &ev, &ctx).await;
            // Drops the store trigger on the next dispatch.
            ctx.token().cancel();
        });

        Handle {
            join,
            cancel: token,
        }
    }
}
