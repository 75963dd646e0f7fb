//! End-to-end flows through a started engine with fake ports.

mod common;

use std::time::Duration;

use common::*;
use pollvisor::{AuthRegistry, Event, EventKind, FetchError, TaskError};

#[tokio::test(start_paused = true)]
async fn authorized_user_is_resolved() {
    let fetch = ScriptedFetch::new();
    let engine = start(
        fetch,
        identity("abc123"),
        AuthRegistry::new().with_user("abc123", true),
    );
    let mut state = engine.watch();

    engine.dispatch(Event::request_authentication());
    let s = wait_state(&mut state, |s| s.user.is_authorized).await;

    assert!(!s.user.loading);
    assert_eq!(s.user.identity.as_deref(), Some("abc123"));
    assert_eq!(s.user.error, None);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unknown_user_is_unauthorized_and_missing_user_fails() {
    let engine = start(ScriptedFetch::new(), identity("mallory"), AuthRegistry::new());
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_authentication());
    let evs = recv_until(&mut rx, EventKind::AuthenticationSucceeded).await;
    assert_eq!(evs.last().unwrap().authorized, Some(false));
    assert!(!engine.state().user.is_authorized);
    engine.shutdown().await.unwrap();

    let engine = start(ScriptedFetch::new(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_authentication());
    recv_until(&mut rx, EventKind::AuthenticationFailed).await;
    let s = engine.state();
    assert!(!s.user.loading);
    assert!(!s.user.is_authorized);
    assert_eq!(s.user.identity, None);
    assert!(matches!(s.user.error, Some(TaskError::AuthResolution { .. })));
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn user_carried_by_request_is_stored_then_resolved() {
    let engine = start(
        ScriptedFetch::new(),
        no_identity(),
        AuthRegistry::new().with_user("alice", true),
    );
    let mut state = engine.watch();

    engine.dispatch(Event::request_authentication().with_user("alice"));
    let s = wait_state(&mut state, |s| s.user.identity.is_some()).await;
    assert_eq!(s.user.identity.as_deref(), Some("alice"));
    assert!(s.user.is_authorized);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn config_success_arms_polling() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(2), r#"["t0","t1","t2"]"#);
    for t in ["t0", "t1", "t2"] {
        fetch.ok(target_url(t), format!(r#"{{"data":{{"from":"{t}"}}}}"#));
    }
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();
    let mut state = engine.watch();

    engine.dispatch(Event::request_config(2));
    let evs = recv_until(&mut rx, EventKind::RequestPollStart).await;
    assert_eq!(
        kinds(&evs),
        vec![
            EventKind::RequestConfig,
            EventKind::ConfigFetchSucceeded,
            EventKind::RequestPollStart
        ]
    );

    let s = wait_state(&mut state, |s| s.report_data.fetch_count >= 3).await;
    assert_eq!(
        s.report_config.targets.as_deref(),
        Some(&["t0".to_string(), "t1".to_string(), "t2".to_string()][..])
    );
    assert_eq!(s.report_config.report_id, Some(2));
    assert!(s.report_data.is_polling);

    let item = s.report_data.data.clone().unwrap();
    assert!(["t0", "t1", "t2"].contains(&item.target.as_str()));
    assert_eq!(item.data["from"], item.target.as_str());
    assert!(fetch.calls().iter().all(|u| u.starts_with(BASE)));
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn config_failure_keeps_targets_and_does_not_poll() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(1), r#"{"title":"blocks","targets":["t0"]}"#);
    fetch.ok(target_url("t0"), "{}");
    fetch.fail(config_url(2), FetchError::Transport("refused".into()));
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_config(1));
    recv_until(&mut rx, EventKind::RequestPollStart).await;
    engine.dispatch(Event::request_poll_stop());

    engine.dispatch(Event::request_config(2));
    let evs = recv_until(&mut rx, EventKind::ConfigFetchFailed).await;
    assert!(!kinds(&evs).contains(&EventKind::ConfigFetchSucceeded));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!kinds(&drain(&mut rx)).contains(&EventKind::RequestPollStart));

    let s = engine.state();
    assert!(!s.report_config.loading);
    assert!(matches!(s.report_config.error, Some(TaskError::ConfigFetch { .. })));
    assert_eq!(s.report_config.title.as_deref(), Some("blocks"));
    assert_eq!(s.targets().len(), 1);
    assert!(!s.report_data.is_polling);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn empty_targets_fail_without_fetching() {
    let fetch = ScriptedFetch::new();
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_poll_start());
    let evs = recv_until(&mut rx, EventKind::RequestPollStop).await;

    assert_eq!(
        kinds(&evs),
        vec![
            EventKind::RequestPollStart,
            EventKind::ReportDataFetchFailed,
            EventKind::RequestPollStop
        ]
    );
    let s = engine.state();
    assert!(!s.report_data.is_polling);
    assert!(!s.report_data.loading);
    assert_eq!(s.report_data.error, Some(TaskError::EmptyTargets));
    assert!(fetch.calls().is_empty());
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_ends_polling_and_no_data_is_applied_after_it() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(7), r#"["t0"]"#);
    fetch.ok(target_url("t0"), r#"{"data":1}"#);
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();
    let mut state = engine.watch();

    engine.dispatch(Event::request_config(7));
    wait_state(&mut state, |s| s.report_data.fetch_count >= 2).await;

    let stop_seq = engine.dispatch(Event::request_poll_stop());
    let count_at_stop = engine.state().report_data.fetch_count;
    let calls_at_stop = fetch.count(&target_url("t0"));

    tokio::time::sleep(Duration::from_secs(10)).await;

    let late: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| e.kind == EventKind::ReportDataFetchSucceeded && e.seq > stop_seq)
        .collect();
    assert!(late.is_empty(), "data applied after stop: {late:?}");

    let s = engine.state();
    assert!(!s.report_data.is_polling);
    assert!(!s.report_data.loading);
    assert_eq!(s.report_data.fetch_count, count_at_stop);
    assert_eq!(fetch.count(&target_url("t0")), calls_at_stop);
    engine.shutdown().await.unwrap();
}
