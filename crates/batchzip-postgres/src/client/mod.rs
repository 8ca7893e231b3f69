//! Pooled access to the manifest database.

mod hooks;
mod pg_client;
mod pg_config;

use deadpool::managed::{Object, Pool};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;

pub use self::pg_client::{PgClient, PgConn, PgPoolStatus};
pub use self::pg_config::{DEFAULT_DATABASE_URL, PgConfig};

type Manager = AsyncDieselConnectionManager<AsyncPgConnection>;

/// Deadpool pool of async diesel connections.
pub type ConnectionPool = Pool<Manager>;

/// Connection checked out of a [`ConnectionPool`].
pub type PooledConnection = Object<Manager>;
