//! Authenticates, loads a report configuration and polls it for a few seconds.
//!
//! ```text
//! POLLVISOR_LOG=debug cargo run --example poll_demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pollvisor::{
    AuthRegistry, Body, Config, Engine, Event, Fetch, FetchError, LogWriter,
    MemoryIdentityStore, Subscribe,
};

/// Serves a fixed configuration and a small data payload per target.
struct StaticFetch;

#[async_trait]
impl Fetch for StaticFetch {
    async fn fetch(&self, url: &str) -> Result<Body, FetchError> {
        if url.contains("/reports") {
            Ok(Body::from(r#"{"title":"Blocks","targets":["btc","eth","ltc"]}"#))
        } else {
            let target = url.rsplit('/').next().unwrap_or_default();
            Ok(Body::from(format!(r#"{{"data":{{"target":"{target}"}}}}"#)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), pollvisor::RuntimeError> {
    pollvisor::init_logging(None);

    let cfg = Config {
        poll_interval: Duration::from_millis(500),
        ..Config::from_env()
    };
    let identity = Arc::new(MemoryIdentityStore::with_entry(cfg.identity_key.clone(), "alice"));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let engine = Engine::builder(cfg, Arc::new(StaticFetch), identity)
        .with_registry(AuthRegistry::new().with_user("alice", true))
        .with_subscribers(subs)
        .build()
        .start();

    engine.dispatch(Event::request_authentication());
    engine.dispatch(Event::request_config(1));
    tokio::time::sleep(Duration::from_secs(3)).await;

    engine.dispatch(Event::request_poll_stop());
    let s = engine.state();
    println!(
        "user={:?} authorized={} title={:?} polls={}",
        s.user.identity, s.user.is_authorized, s.report_config.title, s.report_data.fetch_count
    );

    engine.shutdown().await
}
