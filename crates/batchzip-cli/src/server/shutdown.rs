//! Termination signals.

use std::future::pending;
use std::io;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Completes once the process is asked to stop.
///
/// Listens for Ctrl+C everywhere and for SIGTERM on Unix. A listener that
/// cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let signal = tokio::select! {
        name = interrupt() => name,
        name = terminate() => name,
    };

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal,
        "Stop requested, draining in-flight downloads"
    );
}

async fn interrupt() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        Err(err) => never("SIGINT", err).await,
    }
}

#[cfg(unix)]
async fn terminate() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
            "SIGTERM"
        }
        Err(err) => never("SIGTERM", err).await,
    }
}

#[cfg(not(unix))]
async fn terminate() -> &'static str {
    pending().await
}

async fn never(signal: &'static str, err: io::Error) -> &'static str {
    tracing::warn!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal,
        error = %err,
        "Signal listener unavailable"
    );
    pending().await
}
