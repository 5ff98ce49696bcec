//! # Termination signals for [`Orchestrator::run_until_signal`](crate::Orchestrator::run_until_signal).
//!
//! Unix: `SIGINT`, `SIGTERM` and `SIGQUIT`. Elsewhere: `Ctrl-C` only.

use crate::error::RuntimeError;

/// Waits for the first termination signal and returns its name.
///
/// Listeners are installed per call; a failure to install them is returned as
/// [`RuntimeError::Signal`].
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> Result<&'static str, RuntimeError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    tracing::info!(signal = name, "termination signal received");
    Ok(name)
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> Result<&'static str, RuntimeError> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "CTRL_C", "termination signal received");
    Ok("CTRL_C")
}
