//! # Run a single task execution.
//!
//! Executes one run of a [`Task`] for one trigger event, racing it against the
//! run's cancellation token, and converts failures into events.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   task.run() → Ok(())        → (task emitted its own outcome events)
//!
//! Cancellation:
//!   token fired / Err(Canceled) → nothing emitted
//!
//! Failure:
//!   task.run() → Err(e)        → emit task.on_failure(e) (guarded by the token)
//! ```
//!
//! ## Rules
//! - The task future is dropped as soon as the token fires; in-flight fetches
//!   and sleeps are aborted, not awaited.
//! - Failure events go through the same guarded path as any emission, so a run
//!   cancelled while failing emits nothing.

use tracing::{debug, warn};

use crate::{
    error::TaskError,
    events::Event,
    tasks::{Task, TaskContext},
};

/// Executes `task` for `trigger` until it finishes or `ctx` is cancelled.
pub async fn run_once<T: Task + ?Sized>(
    task: &T,
    trigger: &Event,
    ctx: &TaskContext,
) -> Result<(), TaskError> {
    debug!(task = task.name(), trigger = trigger.seq, "task starting");

    let res = tokio::select! {
        biased;
        _ = ctx.token().cancelled() => Err(TaskError::Canceled),
        res = task.run(trigger, ctx) => res,
    };

    match &res {
        Ok(()) => {
            debug!(task = task.name(), trigger = trigger.seq, "task finished");
        }
        Err(TaskError::Canceled) => {
            debug!(task = task.name(), trigger = trigger.seq, "task cancelled");
        }
        Err(e) => {
            warn!(
                task = task.name(),
                trigger = trigger.seq,
                error = e.as_label(),
                "task failed: {e}"
            );
            for ev in task.on_failure(e.clone()) {
                if ctx.emit(ev).is_err() {
                    debug!(task = task.name(), "failure event dropped after cancel");
                    break;
                }
            }
        }
    }
    res
}
