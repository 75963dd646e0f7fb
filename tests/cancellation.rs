//! Latest-wins and race-against-stop behaviour under overlapping requests.

mod common;

use std::time::Duration;

use common::*;
use pollvisor::{AuthRegistry, Config, Engine, Event, EventKind, FetchError, TaskError};

#[tokio::test(start_paused = true)]
async fn back_to_back_config_requests_yield_one_outcome() {
    let fetch = ScriptedFetch::new();
    let gate = fetch.gated(config_url(3), r#"["t0"]"#);
    fetch.ok(target_url("t0"), "1");
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_config(3));
    engine.dispatch(Event::request_config(3));
    gate.add_permits(2);

    let mut all = recv_until(&mut rx, EventKind::RequestPollStart).await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    engine.dispatch(Event::request_poll_stop());
    tokio::time::sleep(Duration::from_secs(1)).await;
    all.extend(drain(&mut rx));

    let count = |kind: EventKind| all.iter().filter(|e| e.kind == kind).count();
    assert_eq!(count(EventKind::ConfigFetchSucceeded), 1);
    assert_eq!(count(EventKind::ConfigFetchFailed), 0);
    assert_eq!(count(EventKind::RequestPollStart), 1);
    assert_eq!(fetch.count(&config_url(3)), 1);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn superseded_config_fetch_never_lands() {
    let fetch = ScriptedFetch::new();
    let slow = fetch.gated(config_url(1), r#"["old"]"#);
    fetch.ok(config_url(2), r#"["new"]"#);
    fetch.ok(target_url("new"), "2");
    fetch.ok(target_url("old"), "1");
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_config(1));
    eventually(|| fetch.count(&config_url(1)) == 1).await;

    engine.dispatch(Event::request_config(2));
    let evs = recv_until(&mut rx, EventKind::ConfigFetchSucceeded).await;
    assert_eq!(evs.last().unwrap().targets.as_deref(), Some(&["new".to_string()][..]));

    // The superseded fetch completes but its outcome is discarded.
    slow.add_permits(1);
    tokio::time::sleep(Duration::from_secs(5)).await;

    let late = drain(&mut rx);
    assert!(!kinds(&late).contains(&EventKind::ConfigFetchSucceeded));
    assert!(!kinds(&late).contains(&EventKind::ConfigFetchFailed));
    assert_eq!(engine.state().report_config.report_id, Some(2));
    assert_eq!(&*engine.state().targets(), &["new".to_string()][..]);
    assert_eq!(fetch.count(&target_url("old")), 0);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn latest_auth_request_wins() {
    let engine = start(
        ScriptedFetch::new(),
        no_identity(),
        AuthRegistry::new().with_user("alice", true),
    );
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_authentication().with_user("bob"));
    engine.dispatch(Event::request_authentication().with_user("alice"));
    recv_until(&mut rx, EventKind::AuthenticationSucceeded).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(drain(&mut rx).is_empty());
    let s = engine.state();
    assert_eq!(s.user.identity.as_deref(), Some("alice"));
    assert!(s.user.is_authorized);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_during_in_flight_fetch_discards_the_result() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(1), r#"["t0"]"#);
    let gate = fetch.gated(target_url("t0"), r#"{"data":"late"}"#);
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_config(1));
    eventually(|| fetch.count(&target_url("t0")) == 1).await;

    let stop_seq = engine.dispatch(Event::request_poll_stop());
    gate.add_permits(1);
    tokio::time::sleep(Duration::from_secs(5)).await;

    let evs = drain(&mut rx);
    assert!(
        !kinds(&evs).contains(&EventKind::ReportDataFetchSucceeded),
        "in-flight result applied: {evs:?}"
    );
    assert!(evs.iter().all(|e| e.seq <= stop_seq || e.kind != EventKind::ReportDataFetchFailed));
    let s = engine.state();
    assert_eq!(s.report_data.fetch_count, 0);
    assert!(!s.report_data.is_polling);
    assert!(!s.report_data.loading);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_applied_before_loop_starts_prevents_any_fetch() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(1), r#"["t0"]"#);
    fetch.ok(target_url("t0"), "0");
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();

    engine.dispatch(Event::request_config(1));
    recv_until(&mut rx, EventKind::ConfigFetchSucceeded).await;
    // Stop the loop the config armed, wherever it is.
    engine.dispatch(Event::request_poll_stop());
    let calls = fetch.count(&target_url("t0"));
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(fetch.count(&target_url("t0")), calls);
    assert!(!engine.state().report_data.is_polling);

    engine.dispatch(Event::request_poll_start());
    engine.dispatch(Event::request_poll_stop());
    let calls = fetch.count(&target_url("t0"));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fetch.count(&target_url("t0")), calls);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn second_start_while_polling_is_ignored() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(1), r#"["t0"]"#);
    let gate = fetch.gated(target_url("t0"), "0");
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());

    engine.dispatch(Event::request_config(1));
    eventually(|| fetch.count(&target_url("t0")) == 1).await;

    engine.dispatch(Event::request_poll_start());
    engine.dispatch(Event::request_poll_start());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fetch.count(&target_url("t0")), 1, "a second loop was started");

    gate.add_permits(1);
    let mut state = engine.watch();
    wait_state(&mut state, |s| s.report_data.fetch_count == 1).await;
    assert!(engine.state().report_data.is_polling);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_then_start_resumes_polling() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(1), r#"["t0"]"#);
    fetch.ok(target_url("t0"), "0");
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut state = engine.watch();

    engine.dispatch(Event::request_config(1));
    wait_state(&mut state, |s| s.report_data.fetch_count >= 1).await;

    engine.dispatch(Event::request_poll_stop());
    engine.dispatch(Event::request_poll_start());
    let resumed_from = engine.state().report_data.fetch_count;

    let s = wait_state(&mut state, |s| s.report_data.fetch_count >= resumed_from + 2).await;
    assert!(s.report_data.is_polling);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn data_failure_stops_loop_and_restart_recovers() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(1), r#"["t0"]"#);
    fetch.fail(target_url("t0"), FetchError::Transport("reset".into()));
    let engine = start(fetch.clone(), no_identity(), AuthRegistry::new());
    let mut rx = engine.subscribe();
    let mut state = engine.watch();

    engine.dispatch(Event::request_config(1));
    let evs = recv_until(&mut rx, EventKind::RequestPollStop).await;
    assert_eq!(
        kinds(&evs[evs.len() - 2..]),
        vec![EventKind::ReportDataFetchFailed, EventKind::RequestPollStop]
    );

    let s = engine.state();
    assert!(!s.report_data.is_polling);
    assert!(!s.report_data.loading);
    assert!(matches!(
        &s.report_data.error,
        Some(TaskError::DataFetch { target, .. }) if target == "t0"
    ));
    // Not retried on its own.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fetch.count(&target_url("t0")), 1);

    fetch.ok(target_url("t0"), r#"{"data":42}"#);
    engine.dispatch(Event::request_poll_start());
    let s = wait_state(&mut state, |s| s.report_data.fetch_count == 1).await;
    assert!(s.report_data.is_polling);
    assert_eq!(s.report_data.error, None);
    assert_eq!(s.report_data.data.as_ref().unwrap().data, 42);
    engine.shutdown().await.unwrap();
}

fn tiny_bus() -> Config {
    Config {
        bus_capacity: 4,
        ..test_config()
    }
}

#[tokio::test(start_paused = true)]
async fn poll_start_survives_a_burst_that_overflows_the_bus() {
    let fetch = ScriptedFetch::new();
    fetch.ok(target_url("t0"), "0");
    let engine = Engine::builder(tiny_bus(), fetch.clone(), no_identity())
        .build()
        .start();

    engine.dispatch(Event::config_fetch_succeeded(vec!["t0".to_string()]));
    engine.dispatch(Event::request_poll_start());
    for _ in 0..8 {
        engine.dispatch(Event::authentication_failed(TaskError::AuthResolution {
            error: "burst".into(),
        }));
    }
    tokio::time::sleep(Duration::from_secs(5)).await;

    let s = engine.state();
    assert!(s.report_data.is_polling);
    assert!(s.report_data.fetch_count >= 1, "is_polling set but no loop ran");
    assert!(fetch.count(&target_url("t0")) >= 1);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn config_burst_over_a_small_bus_settles_on_the_last_request() {
    let fetch = ScriptedFetch::new();
    for id in 0..10 {
        fetch.ok(config_url(id), format!(r#"["t{id}"]"#));
        fetch.ok(target_url(&format!("t{id}")), "0");
    }
    let engine = Engine::builder(tiny_bus(), fetch.clone(), no_identity())
        .build()
        .start();
    let mut state = engine.watch();

    for id in 0..10 {
        engine.dispatch(Event::request_config(id));
    }
    let s = wait_state(&mut state, |s| {
        !s.report_config.loading && s.report_data.fetch_count >= 1
    })
    .await;

    assert_eq!(s.report_config.report_id, Some(9));
    assert_eq!(&*s.targets(), &["t9".to_string()][..]);
    assert!(s.report_data.is_polling);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_in_a_burst_is_not_lost() {
    let fetch = ScriptedFetch::new();
    fetch.ok(config_url(1), r#"["t0"]"#);
    fetch.ok(target_url("t0"), "0");
    let engine = Engine::builder(tiny_bus(), fetch.clone(), no_identity())
        .build()
        .start();
    let mut state = engine.watch();

    engine.dispatch(Event::request_config(1));
    wait_state(&mut state, |s| s.report_data.fetch_count >= 1).await;

    engine.dispatch(Event::request_poll_stop());
    for _ in 0..8 {
        engine.dispatch(Event::request_authentication());
    }
    let calls = fetch.count(&target_url("t0"));
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(fetch.count(&target_url("t0")), calls);
    assert!(!engine.state().report_data.is_polling);
    engine.shutdown().await.unwrap();
}
