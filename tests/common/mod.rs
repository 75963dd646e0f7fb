#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use pollvisor::{
    AppState, AuthRegistry, Body, Config, Engine, Event, EventKind, Fetch, FetchError,
    IdentityRef, MemoryIdentityStore, RunningEngine,
};
use tokio::sync::{Semaphore, broadcast, watch};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests; output is shown for failing tests only.
///
/// `RUST_LOG=pollvisor=debug cargo test` for details.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

pub const BASE: &str = "http://api";

pub fn config_url(report_id: u64) -> String {
    format!("{BASE}/reports?id={report_id}")
}

pub fn target_url(target: &str) -> String {
    format!("{BASE}/{target}")
}

pub fn test_config() -> Config {
    Config {
        poll_interval: Duration::from_secs(1),
        base_url: BASE.to_string(),
        grace: Duration::from_secs(2),
        ..Config::default()
    }
}

struct Route {
    reply: Result<String, FetchError>,
    gate: Option<Arc<Semaphore>>,
}

/// Fetch fake answering from a url → reply table.
///
/// Unknown urls answer 404. Gated routes block until the test adds a permit.
#[derive(Default)]
pub struct ScriptedFetch {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ok(&self, url: impl Into<String>, body: impl Into<String>) {
        self.insert(url.into(), Ok(body.into()), None);
    }

    pub fn fail(&self, url: impl Into<String>, err: FetchError) {
        self.insert(url.into(), Err(err), None);
    }

    /// Like [`ok`](Self::ok), but each call waits for one permit on the returned gate.
    pub fn gated(&self, url: impl Into<String>, body: impl Into<String>) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.insert(url.into(), Ok(body.into()), Some(Arc::clone(&gate)));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    fn insert(&self, url: String, reply: Result<String, FetchError>, gate: Option<Arc<Semaphore>>) {
        self.routes.lock().unwrap().insert(url, Route { reply, gate });
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn fetch(&self, url: &str) -> Result<Body, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let (reply, gate) = match self.routes.lock().unwrap().get(url) {
            Some(r) => (r.reply.clone(), r.gate.clone()),
            None => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
        };
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        reply.map(Body::new)
    }
}

pub fn identity(user: &str) -> IdentityRef {
    Arc::new(MemoryIdentityStore::with_entry("id", user))
}

pub fn no_identity() -> IdentityRef {
    Arc::new(MemoryIdentityStore::new())
}

pub fn start(fetch: Arc<ScriptedFetch>, identity: IdentityRef, registry: AuthRegistry) -> RunningEngine {
    init_tracing();
    Engine::builder(test_config(), fetch, identity)
        .with_registry(registry)
        .build()
        .start()
}

/// Waits (bounded) until the state satisfies `pred`.
pub async fn wait_state(rx: &mut watch::Receiver<AppState>, pred: impl FnMut(&AppState) -> bool) -> AppState {
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(pred))
        .await
        .expect("state condition not reached in time")
        .expect("store dropped")
        .clone()
}

/// Receives events until one of `kind` arrives; returns all received, inclusive.
pub async fn recv_until(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Vec<Event> {
    let mut seen = Vec::new();
    let fut = async {
        loop {
            let ev = rx.recv().await.expect("bus closed");
            let done = ev.kind == kind;
            seen.push(ev);
            if done {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(30), fut)
        .await
        .expect("event not received in time");
    seen
}

/// Drains everything currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

/// Polls `cond` on a short virtual-time tick until it holds (bounded).
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
