//! Pooled client for the manifest database.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deadpool::Runtime;
use deadpool::managed::Hook;
use derive_more::{Deref, DerefMut};
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};

use super::{ConnectionPool, PooledConnection, hooks};
use crate::{PgConfig, PgError, PgResult, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

/// Checkouts slower than this are logged.
const SLOW_CHECKOUT: Duration = Duration::from_millis(100);

/// Snapshot of the pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgPoolStatus {
    pub max_size: usize,
    /// Connections currently open, idle or checked out.
    pub size: usize,
    pub available: usize,
    /// Requests queued for a connection.
    pub waiting: usize,
}

/// Handle to the manifest database.
///
/// Connections are opened on first use. Clones share the pool.
#[derive(Clone)]
pub struct PgClient {
    pool: ConnectionPool,
    config: Arc<PgConfig>,
}

impl PgClient {
    /// Builds the pool without touching the database.
    pub fn new(config: PgConfig) -> PgResult<Self> {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup = Box::new(hooks::establish);
        let manager =
            AsyncDieselConnectionManager::new_with_config(&config.database_url, manager_config);

        let pool = ConnectionPool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(config.connection_timeout())
            .create_timeout(config.connection_timeout())
            .recycle_timeout(config.idle_timeout())
            .runtime(Runtime::Tokio1)
            .post_recycle(Hook::sync_fn(hooks::inspect_recycled))
            .build()
            .map_err(|e| PgError::Pool(format!("cannot build connection pool: {e}")))?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            database_url = %config.database_url_masked(),
            max_connections = config.postgres_max_connections,
            "Connection pool created"
        );

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    /// Validates `config`, builds the pool and runs `SELECT 1` through it.
    pub async fn new_with_test(config: PgConfig) -> PgResult<Self> {
        config.validate()?;
        let client = Self::new(config)?;
        client.ping().await?;

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            database_url = %client.config.database_url_masked(),
            max_connections = client.config.postgres_max_connections,
            "Manifest database is reachable"
        );

        Ok(client)
    }

    /// Round-trips a trivial query over a pooled connection.
    pub async fn ping(&self) -> PgResult<()> {
        let mut conn = self.get_connection().await?;
        diesel::sql_query("SELECT 1")
            .execute(&mut **conn)
            .await
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET_CONNECTION, error = %e, "Ping failed");
                PgError::from(e)
            })?;
        Ok(())
    }

    /// Checks a connection out of the pool.
    pub async fn get_connection(&self) -> PgResult<PgConn> {
        let started = Instant::now();
        let conn = self.pool.get().await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                error = %e,
                waited = ?started.elapsed(),
                "Connection checkout failed"
            );
            PgError::from(e)
        })?;

        let waited = started.elapsed();
        if waited > SLOW_CHECKOUT {
            let status = self.pool_status();
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                waited = ?waited,
                waiting = status.waiting,
                size = status.size,
                "Slow connection checkout"
            );
        }

        Ok(PgConn { conn })
    }

    pub fn pool_status(&self) -> PgPoolStatus {
        let status = self.pool.status();
        PgPoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("config", &self.config)
            .field("pool", &self.pool_status())
            .finish()
    }
}

/// Connection on loan from the pool; dropping it hands it back.
///
/// Queries in [`crate::query`] are implemented on the connection it
/// dereferences to.
#[derive(Deref, DerefMut)]
pub struct PgConn {
    conn: PooledConnection,
}

impl fmt::Debug for PgConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PgConn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_is_built_lazily() {
        let client = PgClient::new(PgConfig::default().with_pool_size(3)).unwrap();
        let status = client.pool_status();
        assert_eq!(status.max_size, 3);
        assert_eq!(status.size, 0);
        assert_eq!(status.waiting, 0);
    }

    #[test]
    fn debug_masks_password() {
        let client = PgClient::new(PgConfig::new("postgres://u:hunter2@h/db")).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("***"));
        assert!(!debug.contains("hunter2"));
    }
}
