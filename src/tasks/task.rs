//! # Task abstraction and its execution context.
//!
//! A [`Task`] is triggered by one event, performs I/O through the ports it holds,
//! and reports outcomes by emitting events through its [`TaskContext`]. Errors
//! returned from [`Task::run`] are turned into terminal failure events by
//! [`Task::on_failure`]; they never cross the task boundary unconverted.
//!
//! The context carries the task's [`CancellationToken`]. Every suspension point
//! goes through [`TaskContext::guard`] / [`TaskContext::sleep`] so a cancelled
//! task stops at the very next await, and every emission goes through
//! [`TaskContext::emit`] so a cancelled task cannot reach the store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::Event;
use crate::store::{AppState, Store};

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit triggered by an event.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use pollvisor::{Event, Task, TaskContext, TaskError};
///
/// struct StopAfterStart;
///
/// #[async_trait]
/// impl Task for StopAfterStart {
///     fn name(&self) -> &'static str { "stop-after-start" }
///
///     async fn run(&self, _trigger: &Event, ctx: &TaskContext) -> Result<(), TaskError> {
///         ctx.emit(Event::request_poll_stop())?;
///         Ok(())
///     }
///
///     fn on_failure(&self, _err: TaskError) -> Vec<Event> { Vec::new() }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &'static str;

    /// Executes the task for `trigger` until completion, failure or cancellation.
    async fn run(&self, trigger: &Event, ctx: &TaskContext) -> Result<(), TaskError>;

    /// Events announcing a failure of this task.
    fn on_failure(&self, err: TaskError) -> Vec<Event>;
}

/// Per-run context: cancellation token plus guarded access to the store.
#[derive(Clone)]
pub struct TaskContext {
    store: Arc<Store>,
    token: CancellationToken,
}

impl TaskContext {
    /// Creates a context bound to `token`.
    pub fn new(store: Arc<Store>, token: CancellationToken) -> Self {
        Self { store, token }
    }

    /// Token cancelled when this run is superseded, stopped or shut down.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Snapshot of the current application state.
    pub fn state(&self) -> AppState {
        self.store.state()
    }

    /// Dispatches `ev` unless this run is cancelled.
    ///
    /// Returns [`TaskError::Canceled`] when the event was dropped.
    pub fn emit(&self, ev: Event) -> Result<u64, TaskError> {
        self.store
            .dispatch_from(&self.token, ev)
            .ok_or(TaskError::Canceled)
    }

    /// Awaits `fut`, aborting it as soon as the token fires.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, TaskError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TaskError::Canceled),
            out = fut => Ok(out),
        }
    }

    /// Cancellable sleep.
    pub async fn sleep(&self, dur: Duration) -> Result<(), TaskError> {
        self.guard(tokio::time::sleep(dur)).await
    }
}
