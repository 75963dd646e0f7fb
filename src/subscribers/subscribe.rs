//! # Observer trait
//!
//! `Subscribe` is the extension point for watching engine events from the
//! outside (logging, audit, UI bridges). Observers are passive: they cannot
//! dispatch into the store from `on_event` and never influence ordering.
//!
//! ## Contract
//! - Each observer is driven by its own worker fed by a bounded queue owned by
//!   the [`SubscriberSet`](crate::subscribers::SubscriberSet); a slow observer
//!   does not block the store or other observers.
//! - On queue overflow the event is dropped for that observer only.
//!
//! ## Example
//! ```rust
//! use pollvisor::events::{Event, EventKind};
//! use pollvisor::subscribers::Subscribe;
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::AuthenticationFailed {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event observers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this observer's queue (minimum 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
