//! Runtime core: orchestration and lifecycle.
//!
//! The public entry point is [`Engine`]; everything else here is the machinery
//! it spawns.
//!
//! Internal modules:
//! - [`runner`]: executes one task run, racing it against its token and turning failures into events;
//! - [`subscription`]: latest-wins mapping of a request kind to a task;
//! - [`poller`]: sequential polling loop supervisor raced against stop;
//! - [`engine`]: builder, start, graceful shutdown;
//! - [`signal`]: termination signal wait.

mod engine;
mod poller;
mod runner;
mod signal;
mod subscription;

pub use engine::{Engine, EngineBuilder, RunningEngine};
pub use poller::{LoopExit, PollSupervisor};
pub use runner::run_once;
pub use subscription::LatestWins;
