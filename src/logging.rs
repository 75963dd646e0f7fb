//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. explicit `level` argument (if provided)
//! 2. `POLLVISOR_LOG` environment variable (an `EnvFilter` directive, e.g. "debug"
//!    or "pollvisor=trace")
//! 3. default to `info`
//!
//! Logs go to stderr.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialise the global logging subscriber.
///
/// Only the first call installs a subscriber; later calls (or a subscriber
/// installed by the host application) are left alone.
pub fn init_logging(level: Option<tracing::Level>) {
    let filter = match level {
        Some(lvl) => EnvFilter::new(lvl.as_str()),
        None => EnvFilter::try_from_env("POLLVISOR_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
