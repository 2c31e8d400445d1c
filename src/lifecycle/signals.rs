//! OS signal handling.
//!
//! SIGINT, SIGTERM and SIGQUIT each trigger a graceful shutdown. Repeated
//! signals are harmless: shutdown only runs once.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::service::ShutdownTrigger;

/// Install the signal handlers, then spawn a task that calls
/// [`ShutdownTrigger::shutdown`] on every termination signal until `stop`
/// fires.
///
/// The handlers are in place when this returns, so a signal sent right
/// after startup is never lost.
#[cfg(unix)]
pub fn spawn_signal_watcher(
    trigger: ShutdownTrigger,
    mut stop: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = stop.recv() => return,
                Some(()) = interrupt.recv() => "SIGINT",
                Some(()) = terminate.recv() => "SIGTERM",
                Some(()) = quit.recv() => "SIGQUIT",
                else => return,
            };
            tracing::info!(signal = name, "Termination signal received, shutting down");
            trigger.shutdown();
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_signal_watcher(
    trigger: ShutdownTrigger,
    mut stop: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.recv() => return,
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                        return;
                    }
                    tracing::info!(signal = "ctrl-c", "Termination signal received, shutting down");
                    trigger.shutdown();
                }
            }
        }
    }))
}
