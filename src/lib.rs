//! # pollvisor
//!
//! **Pollvisor** is a small event-driven orchestration engine: it authenticates a
//! user, fetches a report configuration, then polls report data until it is told
//! to stop or a fetch fails. All state changes go through one serialized store,
//! so concurrent tasks can overlap without racing on the state they produce.
//!
//! ## Architecture
//! ```text
//!   caller / UI
//!      │ dispatch(Request*)
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Store (one lock per dispatch)                                    │
//! │   seq += 1 ─► apply ─► cancel triggers ─► watch ─► feeds ─► bus   │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        │ listen()         │ listen()         │ listen()      │ subscribe()
//!        ▼                  ▼                  ▼               ▼
//!  ┌─────────────┐   ┌─────────────┐   ┌────────────────┐  SubscriberSet
//!  │ LatestWins  │   │ LatestWins  │   │ PollSupervisor │   ├─► LogWriter
//!  │ RequestAuth │   │ RequestCfg  │   │ start ⟷ stop   │   └─► ...
//!  └──────┬──────┘   └──────┬──────┘   └───────┬────────┘
//!         ▼                 ▼                  ▼
//!      AuthTask         ConfigTask          PollTask
//!  (IdentityStore)       (Fetch)        (Fetch, loop + sleep)
//!         │                 │                  │
//!         └──── emit outcome events (guarded by the run's token) ───► Store
//! ```
//!
//! ### Ordering
//! - Every event gets a sequence number; state is the fold of all events in
//!   that order ([`replay`]).
//! - A superseded run (latest-wins) or a stopped polling loop can never have
//!   an event applied after the request that cancelled it.
//! - At most one polling loop is alive at a time.
//!
//! ## Features
//! | Area           | Description                                        | Key types / traits                       |
//! |----------------|----------------------------------------------------|------------------------------------------|
//! | **Engine**     | Wiring, start, graceful shutdown                   | [`Engine`], [`RunningEngine`]            |
//! | **State**      | Pure reducers and the serialized store             | [`Store`], [`AppState`], [`apply`]       |
//! | **Tasks**      | Auth, config and polling units                     | [`Task`], [`AuthTask`], [`PollTask`]     |
//! | **Ports**      | Injected I/O                                       | [`Fetch`], [`IdentityStore`]             |
//! | **Observers**  | Passive event hooks                                | [`Subscribe`], [`LogWriter`]             |
//! | **Errors**     | Typed task and runtime errors                      | [`TaskError`], [`RuntimeError`]          |
//! | **Config**     | Poll interval, endpoints, capacities, grace        | [`Config`]                               |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use pollvisor::{
//!     AuthRegistry, Body, Config, Engine, Event, Fetch, FetchError, LogWriter,
//!     MemoryIdentityStore, Subscribe,
//! };
//!
//! struct Static;
//!
//! #[async_trait::async_trait]
//! impl Fetch for Static {
//!     async fn fetch(&self, url: &str) -> Result<Body, FetchError> {
//!         if url.contains("/reports") {
//!             Ok(Body::from(r#"{"title":"Blocks","targets":["t1","t2"]}"#))
//!         } else {
//!             Ok(Body::from(r#"{"data":{"height":1}}"#))
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pollvisor::RuntimeError> {
//!     pollvisor::init_logging(None);
//!
//!     let identity = Arc::new(MemoryIdentityStore::with_entry("id", "alice"));
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let engine = Engine::builder(Config::from_env(), Arc::new(Static), identity)
//!         .with_registry(AuthRegistry::new().with_user("alice", true))
//!         .with_subscribers(subs)
//!         .build()
//!         .start();
//!
//!     engine.dispatch(Event::request_authentication());
//!     engine.dispatch(Event::request_config(42));
//!     engine.run_until_signal().await
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod logging;
pub mod ports;
pub mod store;
pub mod subscribers;
pub mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{Engine, EngineBuilder, LoopExit, RunningEngine};
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use logging::init_logging;
pub use ports::{
    Body, Fetch, FetchError, FetchRef, IdentityRef, IdentityStore, MemoryIdentityStore,
};
pub use store::{
    AppState, ReportConfigState, ReportDataState, ReportItem, Store, TargetId, UserId, UserState,
    apply, replay,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{AuthRegistry, AuthTask, ConfigTask, PollTask, Task, TaskContext, TaskRef};
