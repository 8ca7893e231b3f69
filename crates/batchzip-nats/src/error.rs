//! NATS errors.

use std::time::Duration;

/// Result alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures talking to NATS or its key-value buckets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("NATS connection failed: {0}")]
    Connection(#[from] async_nats::Error),

    #[error("NATS did not answer within {0:?}")]
    Timeout(Duration),

    /// The token contains characters KV keys cannot carry.
    #[error("'{0}' is not a valid KV key")]
    InvalidKey(String),

    #[error("Invalid NATS configuration: {0}")]
    InvalidConfig(String),

    /// A bucket call was rejected by the server.
    #[error("KV {op} failed: {source}")]
    Kv {
        op: &'static str,
        #[source]
        source: async_nats::Error,
    },
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    pub(crate) fn kv<E>(op: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Kv {
            op,
            source: Box::new(source),
        }
    }
}
