//! # Event bus for broadcasting applied events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. The only publisher
//! is the [`Store`](crate::Store), which publishes each event right after applying
//! it; the receivers are the subscriber fan-out and external watchers. Task
//! triggers do not ride the bus (see [`Store::listen`](crate::Store::listen)).
//!
//! ## Architecture
//! ```text
//! Publisher (one):                 Receivers (many):
//!   Store::dispatch ──► Bus ──────┬──► SubscriberSet listener
//!   (serialized)   (broadcast)    └──► RunningEngine::subscribe() callers
//! ```
//!
//! ## Rules
//! - **Apply order**: events are published under the store lock, so every receiver
//!   observes them in `seq` order.
//! - **Bounded capacity**: slow receivers get `RecvError::Lagged(n)` and skip `n` items.
//! - **No persistence**: a receiver only sees events sent after it subscribed.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for applied events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
