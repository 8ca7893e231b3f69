//! Startup and exit logging around the accept loop.

use std::future::Future;
use std::io;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::server::{Result, ServerError};
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Awaits `run` and reports how the server ended.
pub async fn serve_with_shutdown<F>(config: &ServerConfig, run: impl FnOnce() -> F) -> Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    let addr = config.server_addr();
    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            %addr,
            "Listening on every interface"
        );
    }
    tracing::info!(target: TRACING_TARGET_SERVER_STARTUP, %addr, "Accepting downloads");

    let started = Instant::now();
    let outcome = run().await.map_err(ServerError::Runtime);
    let uptime = started.elapsed();

    if let Err(err) = &outcome {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %err,
            code = err.error_code(),
            suggestion = err.suggestion(),
            ?uptime,
            "Server stopped with an error"
        );
    } else {
        tracing::info!(target: TRACING_TARGET_SERVER_SHUTDOWN, ?uptime, "Server stopped");
    }

    outcome
}
