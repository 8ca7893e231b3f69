//! Connection setup and pool hooks.

use std::time::Instant;

use deadpool::managed::{HookResult, Metrics};
use diesel::ConnectionResult;
use diesel_async::pooled_connection::{PoolError, PoolableConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::{PgConfig, TRACING_TARGET_CONNECTION};

/// Opens a connection for the pool manager and records how long it took.
///
/// The password never reaches the logs.
pub(super) fn establish<C>(url: &str) -> BoxFuture<'_, ConnectionResult<C>>
where
    C: AsyncConnection + 'static,
{
    let started = Instant::now();

    async move {
        let connection = C::establish(url).await;
        let target = PgConfig::mask_url(url);

        if let Err(err) = &connection {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                target_url = %target,
                elapsed = ?started.elapsed(),
                error = %err,
                "Could not open manifest database connection"
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET_CONNECTION,
                target_url = %target,
                elapsed = ?started.elapsed(),
                "Opened manifest database connection"
            );
        }

        connection
    }
    .boxed()
}

/// Flags connections that come back from recycling unusable.
pub(super) fn inspect_recycled(
    conn: &mut AsyncPgConnection,
    metrics: &Metrics,
) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            recycled = metrics.recycle_count,
            age = ?metrics.age(),
            "Recycled connection is broken"
        );
    }

    Ok(())
}
