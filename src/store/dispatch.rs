//! # Serialized event dispatcher.
//!
//! [`Store`] owns the [`AppState`] and is the single point where events enter
//! the system. Each dispatch runs under one lock:
//!
//! ```text
//! dispatch(ev)
//!   ├─► seq += 1, stamp ev.seq
//!   ├─► state = reducer::apply(state, ev)
//!   ├─► fire cancel triggers armed for ev.kind
//!   ├─► watch  ◄── new state
//!   ├─► listen ◄── ev (lossless, per-kind feeds)
//!   └─► bus    ◄── ev
//! ```
//!
//! ## Cancel triggers
//! [`Store::cancel_on`] arms a one-shot trigger: the first event of a kind with a
//! sequence past a given point cancels a token, inside the same critical section
//! that applied it. Tasks emit through [`Store::dispatch_from`], which drops the
//! event if its token is already cancelled, checked under that same lock. Together
//! these give "no emission after cancellation": once a stop or superseding request
//! is applied, nothing from the cancelled task can be applied after it.
//!
//! ## Rules
//! - Dispatches never run concurrently; apply order equals `seq` order.
//! - Bus and watch receivers observe events and states in apply order.
//! - The bus is bounded and may lag; anything that must not miss an event
//!   (task triggers) reads a [`Store::listen`] feed instead.
//! - Triggers whose token was cancelled elsewhere are pruned on the next dispatch.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::events::{Bus, Event, EventKind};

use super::reducer;
use super::state::AppState;

/// One-shot cancellation armed on an event kind.
struct Trigger {
    kind: EventKind,
    after: u64,
    token: CancellationToken,
}

/// Unbounded feed of selected event kinds.
struct Listener {
    kinds: Vec<EventKind>,
    tx: mpsc::UnboundedSender<Event>,
}

struct Inner {
    state: AppState,
    seq: u64,
    last_seen: HashMap<EventKind, u64>,
    triggers: Vec<Trigger>,
    listeners: Vec<Listener>,
}

/// Owner of the application state and the event bus.
pub struct Store {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<AppState>,
    bus: Bus,
}

impl Store {
    /// Creates a store with the default state and a bus of `bus_capacity`.
    pub fn new(bus_capacity: usize) -> Self {
        let state = AppState::default();
        let (state_tx, _rx) = watch::channel(state.clone());
        Self {
            inner: Mutex::new(Inner {
                state,
                seq: 0,
                last_seen: HashMap::new(),
                triggers: Vec::new(),
                listeners: Vec::new(),
            }),
            state_tx,
            bus: Bus::new(bus_capacity),
        }
    }

    /// Applies `ev` and broadcasts it. Returns the assigned sequence number.
    pub fn dispatch(&self, ev: Event) -> u64 {
        let mut inner = self.lock();
        self.commit(&mut inner, ev)
    }

    /// Applies `ev` unless `token` is cancelled.
    ///
    /// Returns `None` when the event was dropped.
    pub fn dispatch_from(&self, token: &CancellationToken, ev: Event) -> Option<u64> {
        let mut inner = self.lock();
        if token.is_cancelled() {
            debug!(kind = ev.kind.as_label(), "dropped event from cancelled task");
            return None;
        }
        Some(self.commit(&mut inner, ev))
    }

    /// Cancels `token` when an event of `kind` with `seq > after` is dispatched.
    ///
    /// If one was already dispatched, the token is cancelled right away.
    pub fn cancel_on(&self, kind: EventKind, after: u64, token: CancellationToken) {
        let mut inner = self.lock();
        let seen = inner.last_seen.get(&kind).copied().unwrap_or(0);
        if seen > after {
            trace!(kind = kind.as_label(), after, seen, "trigger already passed");
            token.cancel();
            return;
        }
        inner.triggers.push(Trigger { kind, after, token });
    }

    /// Feed of every event of `kinds` applied from now on, in apply order.
    ///
    /// Unlike [`Store::subscribe`] the feed never lags or drops events. The
    /// feed is removed once its receiver is dropped.
    pub fn listen(&self, kinds: &[EventKind]) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().listeners.push(Listener {
            kinds: kinds.to_vec(),
            tx,
        });
        rx
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.lock().state.clone()
    }

    /// Receiver notified on every applied event.
    pub fn watch(&self) -> watch::Receiver<AppState> {
        self.state_tx.subscribe()
    }

    /// Receiver for applied events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Sequence number of the last applied event.
    pub fn last_seq(&self) -> u64 {
        self.lock().seq
    }

    fn commit(&self, inner: &mut Inner, ev: Event) -> u64 {
        inner.seq += 1;
        let seq = inner.seq;
        let ev = ev.stamped(seq);

        inner.state = reducer::apply(&inner.state, &ev);
        inner.last_seen.insert(ev.kind, seq);
        inner.triggers.retain(|t| {
            if t.kind == ev.kind && seq > t.after {
                t.token.cancel();
                return false;
            }
            !t.token.is_cancelled()
        });

        debug!(seq, kind = ev.kind.as_label(), "event applied");
        self.state_tx.send_replace(inner.state.clone());
        inner
            .listeners
            .retain(|l| !l.kinds.contains(&ev.kind) || l.tx.send(ev.clone()).is_ok());
        self.bus.publish(ev);
        seq
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(crate::Config::default().bus_capacity_clamped())
    }
}
