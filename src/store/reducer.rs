//! # Pure state transitions.
//!
//! [`apply`] is total: every `(state, event)` pair yields a state, and events a
//! subtree does not handle leave that subtree untouched (same `Arc`).
//!
//! ```text
//! RequestAuthentication     ─► user.loading = true
//! AuthenticationSucceeded   ─► user { identity, is_authorized, loading = false }
//! AuthenticationFailed      ─► user { error, loading = false, unauthorized }
//! RequestConfig             ─► config { report_id, loading = true }
//! ConfigFetchSucceeded      ─► config { targets, title, loading = false }
//! ConfigFetchFailed         ─► config { error, loading = false }
//! RequestPollStart          ─► data { is_polling = true, loading = true }
//! ReportDataFetchSucceeded  ─► data { item, fetch_count += 1, loading = false }
//! ReportDataFetchFailed     ─► data { error, is_polling = false, loading = false }
//! RequestPollStop           ─► data { is_polling = false, loading = false }
//! ```
//!
//! No I/O and no clocks in here; replaying the same events always yields the
//! same state.

use std::sync::Arc;

use crate::events::{Event, EventKind};

use super::state::{AppState, ReportConfigState, ReportDataState, UserState};

/// Applies one event to the state tree.
pub fn apply(state: &AppState, ev: &Event) -> AppState {
    AppState {
        user: reduce_user(&state.user, ev),
        report_config: reduce_report_config(&state.report_config, ev),
        report_data: reduce_report_data(&state.report_data, ev),
    }
}

/// Folds `events` over the default state.
pub fn replay<'a>(events: impl IntoIterator<Item = &'a Event>) -> AppState {
    events
        .into_iter()
        .fold(AppState::default(), |state, ev| apply(&state, ev))
}

fn reduce_user(state: &Arc<UserState>, ev: &Event) -> Arc<UserState> {
    let next = match ev.kind {
        EventKind::RequestAuthentication => UserState {
            loading: true,
            error: None,
            ..(**state).clone()
        },
        EventKind::AuthenticationSucceeded => UserState {
            loading: false,
            error: None,
            identity: ev.user.clone(),
            is_authorized: ev.authorized.unwrap_or(false),
        },
        EventKind::AuthenticationFailed => UserState {
            loading: false,
            error: ev.error.clone(),
            identity: None,
            is_authorized: false,
        },
        _ => return Arc::clone(state),
    };
    Arc::new(next)
}

fn reduce_report_config(state: &Arc<ReportConfigState>, ev: &Event) -> Arc<ReportConfigState> {
    let next = match ev.kind {
        EventKind::RequestConfig => ReportConfigState {
            loading: true,
            error: None,
            report_id: ev.report_id,
            ..(**state).clone()
        },
        EventKind::ConfigFetchSucceeded => ReportConfigState {
            loading: false,
            error: None,
            title: ev.title.clone(),
            targets: ev.targets.clone(),
            ..(**state).clone()
        },
        // Previous targets stay usable by a running poll loop.
        EventKind::ConfigFetchFailed => ReportConfigState {
            loading: false,
            error: ev.error.clone(),
            ..(**state).clone()
        },
        _ => return Arc::clone(state),
    };
    Arc::new(next)
}

fn reduce_report_data(state: &Arc<ReportDataState>, ev: &Event) -> Arc<ReportDataState> {
    let next = match ev.kind {
        EventKind::RequestPollStart => ReportDataState {
            loading: true,
            error: None,
            is_polling: true,
            ..(**state).clone()
        },
        EventKind::ReportDataFetchSucceeded => ReportDataState {
            loading: false,
            error: None,
            data: ev.item.clone().or_else(|| state.data.clone()),
            fetch_count: state.fetch_count + 1,
            is_polling: state.is_polling,
        },
        EventKind::ReportDataFetchFailed => ReportDataState {
            loading: false,
            error: ev.error.clone(),
            is_polling: false,
            ..(**state).clone()
        },
        EventKind::RequestPollStop => ReportDataState {
            loading: false,
            is_polling: false,
            ..(**state).clone()
        },
        _ => return Arc::clone(state),
    };
    Arc::new(next)
}
