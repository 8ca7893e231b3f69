//! Manifest database errors.

use deadpool::managed::TimeoutType;
use diesel::result::{ConnectionError, Error as QueryError};
use diesel_async::pooled_connection::PoolError as ManagerError;
use diesel_async::pooled_connection::deadpool::PoolError;

/// Everything that can go wrong between a config and a query result.
#[derive(Debug, thiserror::Error)]
pub enum PgError {
    #[error("Invalid database configuration: {0}")]
    Config(String),

    /// The pool gave up waiting, connecting or recycling.
    #[error("Timed out while {} a database connection", timeout_phase(.0))]
    Timeout(TimeoutType),

    #[error("Database connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Database query failed: {0}")]
    Query(#[from] QueryError),

    /// The pool itself is misconfigured or closed.
    #[error("Connection pool error: {0}")]
    Pool(String),
}

fn timeout_phase(timeout: &TimeoutType) -> &'static str {
    match timeout {
        TimeoutType::Wait => "waiting for",
        TimeoutType::Create => "opening",
        TimeoutType::Recycle => "recycling",
    }
}

impl From<PoolError> for PgError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Timeout(timeout) => Self::Timeout(timeout),
            PoolError::Backend(ManagerError::ConnectionError(err)) => Self::Connection(err),
            PoolError::Backend(ManagerError::QueryError(err)) => Self::Query(err),
            PoolError::Closed => Self::Pool("pool is closed".to_owned()),
            PoolError::NoRuntimeSpecified => Self::Pool("pool has no async runtime".to_owned()),
            PoolError::PostCreateHook(err) => Self::Pool(format!("post-create hook failed: {err}")),
        }
    }
}

/// Result alias for manifest database calls.
pub type PgResult<T, E = PgError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_messages_name_the_phase() {
        let err = PgError::from(PoolError::Timeout(TimeoutType::Wait));
        assert_eq!(
            err.to_string(),
            "Timed out while waiting for a database connection"
        );
    }

    #[test]
    fn closed_pool_is_reported() {
        let err = PgError::from(PoolError::Closed);
        assert_eq!(err.to_string(), "Connection pool error: pool is closed");
    }
}
