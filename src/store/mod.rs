//! State store: state tree, pure reducers, serialized dispatcher.
//!
//! ## Contents
//! - [`AppState`] and its subtrees ([`UserState`], [`ReportConfigState`], [`ReportDataState`])
//! - [`apply`] / [`replay`] pure, total transition functions
//! - [`Store`] the only mutation path: one event at a time, in dispatch order
//!
//! ```text
//! tasks / callers ── dispatch(ev) ──► Store ──► reducer::apply ──► AppState'
//!                                       │
//!                                       ├──► watch (state snapshots)
//!                                       └──► Bus   (applied events)
//! ```

mod dispatch;
mod reducer;
mod state;

pub use dispatch::Store;
pub use reducer::{apply, replay};
pub use state::{
    AppState, ReportConfigState, ReportDataState, ReportItem, TargetId, UserId, UserState,
};
