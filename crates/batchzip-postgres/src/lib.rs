#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for client-related operations.
///
/// Use this target for logging client initialization, configuration, and lifecycle events.
pub const TRACING_TARGET_CLIENT: &str = "batchzip_postgres::client";

/// Tracing target for database query operations.
pub const TRACING_TARGET_QUERY: &str = "batchzip_postgres::queries";

/// Tracing target for database connection operations.
///
/// Use this target for logging connection establishment, pool management, and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "batchzip_postgres::connection";

mod client;
mod error;
pub mod query;
mod resolver;
mod schema;

pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{
    ConnectionPool, DEFAULT_DATABASE_URL, PgClient, PgConfig, PgConn, PgPoolStatus,
    PooledConnection,
};
pub use crate::error::{PgError, PgResult};
