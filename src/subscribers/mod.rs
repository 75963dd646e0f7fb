//! # Event observers.
//!
//! Observers receive every applied event, in apply order, after the store has
//! already moved on. They are for side channels only (logs, audit, bridges).
//!
//! ```text
//! Store ── dispatch ──► Bus ──► engine listener ──► SubscriberSet::emit(&Event)
//!                                                     ├──► LogWriter
//!                                                     └──► custom observers
//! ```

mod log;
mod subscribe;
mod subscriber_set;

pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
