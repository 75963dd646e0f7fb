//! Events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** that carries
//! applied events from the store to the engine's subscriptions.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: `Store::dispatch` (after apply, under the store lock).
//! - **Consumers**: latest-wins subscriptions (auth, config), the poll supervisor,
//!   and the `SubscriberSet` listener.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
