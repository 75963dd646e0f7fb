//! # Engine: composition root and lifecycle.
//!
//! [`Engine`] wires the store, the three tasks and the observers together.
//! [`Engine::start`] spawns every long-lived worker and returns a
//! [`RunningEngine`] handle; it consumes the engine, so the wiring happens once.
//!
//! ## Architecture
//! ```text
//! Engine::start()
//!   ├─► Store (state + bus)
//!   ├─► trigger feeds ◄── listen()   (lossless, taken before any spawn)
//!   ├─► observer rx   ◄── subscribe() (bus, may lag)
//!   ├─► LatestWins(RequestAuthentication → AuthTask)
//!   ├─► LatestWins(RequestConfig        → ConfigTask)
//!   ├─► PollSupervisor(RequestPollStart → PollTask, raced against RequestPollStop)
//!   └─► listener: bus ──► SubscriberSet::emit(&Event)
//!
//! RunningEngine::shutdown()
//!   ├─► runtime.cancel()   → child tokens of every in-flight run
//!   └─► join workers until deadline = now + grace
//!          ├─ all joined → Ok(())
//!          └─ otherwise  → abort stragglers, Err(GraceExceeded { stuck })
//! ```
//!
//! ## Example
//! ```rust,ignore
//! let engine = Engine::builder(Config::from_env(), fetch, identity)
//!     .with_registry(AuthRegistry::new().with_user("alice", true))
//!     .with_subscribers(vec![Arc::new(LogWriter::new())])
//!     .build()
//!     .start();
//!
//! engine.dispatch(Event::request_authentication());
//! engine.dispatch(Event::request_config(42));
//! engine.run_until_signal().await?;
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};
use crate::ports::{FetchRef, IdentityRef};
use crate::store::{AppState, Store};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{AuthRegistry, AuthTask, ConfigTask, PollTask};

use super::poller::PollSupervisor;
use super::signal;
use super::subscription::LatestWins;

/// Builder for [`Engine`].
pub struct EngineBuilder {
    cfg: Config,
    fetch: FetchRef,
    identity: IdentityRef,
    registry: AuthRegistry,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EngineBuilder {
    /// Sets the authorization registry consulted by the auth task.
    ///
    /// Without one every user resolves as unauthorized.
    pub fn with_registry(mut self, registry: AuthRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets event observers. Each one gets its own bounded queue and worker.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            cfg: Arc::new(self.cfg),
            fetch: self.fetch,
            identity: self.identity,
            registry: self.registry,
            subscribers: self.subscribers,
        }
    }
}

/// Fully wired, not yet started engine.
pub struct Engine {
    cfg: Arc<Config>,
    fetch: FetchRef,
    identity: IdentityRef,
    registry: AuthRegistry,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Engine {
    pub fn builder(cfg: Config, fetch: FetchRef, identity: IdentityRef) -> EngineBuilder {
        EngineBuilder {
            cfg,
            fetch,
            identity,
            registry: AuthRegistry::new(),
            subscribers: Vec::new(),
        }
    }

    /// Spawns all workers on the current Tokio runtime.
    ///
    /// # Panics
    /// Outside of a Tokio runtime.
    pub fn start(self) -> RunningEngine {
        let store = Arc::new(Store::new(self.cfg.bus_capacity_clamped()));
        let runtime = CancellationToken::new();

        let auth_rx = store.listen(&[EventKind::RequestAuthentication]);
        let config_rx = store.listen(&[EventKind::RequestConfig]);
        let poll_rx = store.listen(&[EventKind::RequestPollStart, EventKind::RequestPollStop]);
        let observer_rx = (!self.subscribers.is_empty()).then(|| store.subscribe());

        let auth = LatestWins::new(
            EventKind::RequestAuthentication,
            Arc::new(AuthTask::new(
                self.identity,
                self.registry,
                self.cfg.identity_key.clone(),
            )),
            Arc::clone(&store),
        );
        let config = LatestWins::new(
            EventKind::RequestConfig,
            Arc::new(ConfigTask::new(Arc::clone(&self.fetch), Arc::clone(&self.cfg))),
            Arc::clone(&store),
        );
        let poller = PollSupervisor::new(
            Arc::new(PollTask::new(self.fetch, Arc::clone(&self.cfg))),
            Arc::clone(&store),
        );

        let mut workers = vec![
            ("auth", tokio::spawn(auth.run(auth_rx, runtime.clone()))),
            ("config", tokio::spawn(config.run(config_rx, runtime.clone()))),
            ("poll", tokio::spawn(poller.run(poll_rx, runtime.clone()))),
        ];
        if let Some(rx) = observer_rx {
            let set = SubscriberSet::new(self.subscribers);
            workers.push(("observers", spawn_observers(set, rx, runtime.clone())));
        }

        info!(
            workers = workers.len(),
            poll_interval = ?self.cfg.poll_interval,
            "engine started"
        );
        RunningEngine {
            store,
            workers,
            grace: self.cfg.grace,
            cancel_on_drop: runtime.drop_guard(),
        }
    }
}

/// Forwards bus events to the subscriber set until shutdown.
fn spawn_observers(
    set: SubscriberSet,
    mut rx: broadcast::Receiver<Event>,
    runtime: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = runtime.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "observer listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        set.shutdown().await;
    })
}

/// Handle to a started engine.
///
/// Dropping the handle cancels every worker without waiting for them; use
/// [`RunningEngine::shutdown`] to wait within the grace period.
pub struct RunningEngine {
    store: Arc<Store>,
    workers: Vec<(&'static str, JoinHandle<()>)>,
    grace: std::time::Duration,
    cancel_on_drop: DropGuard,
}

impl RunningEngine {
    /// Dispatches an event and returns its sequence number.
    pub fn dispatch(&self, ev: Event) -> u64 {
        self.store.dispatch(ev)
    }

    pub fn state(&self) -> AppState {
        self.store.state()
    }

    pub fn watch(&self) -> watch::Receiver<AppState> {
        self.store.watch()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Cancels all subscriptions and the active polling loop, then waits for
    /// the workers to finish within the configured grace.
    ///
    /// Workers still running at the deadline are aborted and reported in
    /// [`RuntimeError::GraceExceeded`].
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        let RunningEngine {
            workers,
            grace,
            cancel_on_drop,
            ..
        } = self;

        info!("shutdown requested");
        cancel_on_drop.disarm().cancel();

        let deadline = Instant::now() + grace;
        let mut stuck = Vec::new();
        for (name, mut join) in workers {
            match tokio::time::timeout_at(deadline, &mut join).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(worker = name, error = %e, "worker ended abnormally"),
                Err(_) => {
                    join.abort();
                    stuck.push(name.to_string());
                }
            }
        }

        if stuck.is_empty() {
            info!("all workers stopped within grace");
            Ok(())
        } else {
            warn!(?stuck, ?grace, "grace exceeded");
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    }

    /// Runs until SIGINT/SIGTERM (Ctrl-C off Unix), then shuts down.
    pub async fn run_until_signal(self) -> Result<(), RuntimeError> {
        if let Err(e) = signal::termination().await {
            warn!(error = %e, "cannot listen for termination signals; shutting down");
        }
        self.shutdown().await
    }
}
