//! Termination signal wait used by [`RunningEngine::run_until_signal`](super::RunningEngine::run_until_signal).
//!
//! Unix: SIGINT or SIGTERM. Elsewhere: Ctrl-C only.

/// Completes on the first termination signal.
///
/// Fails only if a signal listener cannot be installed.
#[cfg(unix)]
pub(crate) async fn termination() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    };
    tracing::info!(signal = name, "termination signal received");
    Ok(())
}

#[cfg(not(unix))]
pub(crate) async fn termination() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl-c", "termination signal received");
    Ok(())
}
