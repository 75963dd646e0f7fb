//! # Engine configuration.
//!
//! Provides [`Config`] centralized settings for the engine: poll cadence, fetch
//! URL layout, identity key, bus capacity and shutdown grace.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `poll_interval = 0s` → poll again as soon as the previous item is applied
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use pollvisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.poll_interval = Duration::from_secs(2);
//! cfg.base_url = "https://api.example.com".into();
//!
//! assert_eq!(cfg.config_url(7), "https://api.example.com/reports?id=7");
//! assert_eq!(cfg.target_url("stats"), "https://api.example.com/stats");
//! ```

use std::time::Duration;

use tracing::warn;

/// Global configuration for the engine.
///
/// ## Field semantics
/// - `poll_interval`: delay after each successful data fetch
/// - `base_url`: prefix for the config and target URLs handed to the fetch port
/// - `identity_key`: key of the current user id in the identity store
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `grace`: how long `shutdown` waits for tasks to join
#[derive(Clone, Debug)]
pub struct Config {
    /// Delay between two polls of the data loop.
    pub poll_interval: Duration,

    /// Prefix for all fetched URLs (no trailing slash).
    pub base_url: String,

    /// Identity store key holding the current user id.
    pub identity_key: String,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging more than `bus_capacity` events observe `Lagged` and skip
    /// older items.
    pub bus_capacity: usize,

    /// Maximum time `RunningEngine::shutdown` waits for tasks to finish.
    pub grace: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// URL of the configuration (target list) of a report.
    pub fn config_url(&self, report_id: u64) -> String {
        format!("{}/reports?id={report_id}", self.base_url)
    }

    /// URL of one poll target.
    pub fn target_url(&self, target: &str) -> String {
        format!("{}/{target}", self.base_url)
    }

    /// Defaults overlaid with `POLLVISOR_*` environment variables.
    ///
    /// - `POLLVISOR_POLL_INTERVAL_MS`
    /// - `POLLVISOR_BASE_URL`
    /// - `POLLVISOR_IDENTITY_KEY`
    /// - `POLLVISOR_GRACE_MS`
    ///
    /// Unparsable numbers are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(ms) = millis(&lookup, "POLLVISOR_POLL_INTERVAL_MS") {
            cfg.poll_interval = ms;
        }
        if let Some(ms) = millis(&lookup, "POLLVISOR_GRACE_MS") {
            cfg.grace = ms;
        }
        if let Some(url) = lookup("POLLVISOR_BASE_URL") {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = lookup("POLLVISOR_IDENTITY_KEY") {
            cfg.identity_key = key;
        }
        cfg
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring invalid duration");
            None
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `poll_interval = 10s`
    /// - `base_url = ""` (relative URLs)
    /// - `identity_key = "id"`
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            base_url: String::new(),
            identity_key: "id".to_string(),
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}
