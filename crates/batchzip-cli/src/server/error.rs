//! Errors that stop the HTTP server.

use std::io;
use std::net::SocketAddr;

/// Result alias for server startup and shutdown.
pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The accept loop failed after startup.
    #[error("Server stopped unexpectedly: {0}")]
    Runtime(#[source] io::Error),
}

impl ServerError {
    /// Keeps the whole `anyhow` chain in the message.
    pub fn invalid_config(err: &anyhow::Error) -> Self {
        Self::InvalidConfig(format!("{err:#}"))
    }

    pub fn bind(addr: SocketAddr, source: io::Error) -> Self {
        Self::Bind { addr, source }
    }

    /// Stable code for log searches.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "E001",
            Self::Bind { .. } => "E002",
            Self::Runtime(_) => "E003",
        }
    }

    /// What the operator can change, when the cause is recognizable.
    pub fn suggestion(&self) -> Option<&'static str> {
        let kind = match self {
            Self::InvalidConfig(_) => return Some("See `batchzip --help` for accepted values"),
            Self::Bind { source, .. } => source.kind(),
            Self::Runtime(err) => err.kind(),
        };

        match kind {
            io::ErrorKind::AddrInUse => Some("Another process holds this port; pick another with --port"),
            io::ErrorKind::PermissionDenied => Some("Ports below 1024 need elevated privileges"),
            io::ErrorKind::AddrNotAvailable => Some("No local interface has this address; check --host"),
            _ => None,
        }
    }
}
