//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── log_format: LogFormat         # text or json
//! ├── server: ServerConfig          # Host, port, shutdown
//! ├── middleware: MiddlewareConfig  # Request timeout
//! └── service: ServiceConfig        # Manifest backend, object store, archive
//! ```
//!
//! Every option can be given as a flag or through its environment variable.
//!
//! ```bash
//! batchzip --port 8080 --manifest-backend nats
//! PORT=8080 MANIFEST_BACKEND=nats batchzip
//! ```

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use batchzip_server::service::{ManifestBackend, ServiceConfig};
use clap::{Parser, ValueEnum};
pub use middleware::MiddlewareConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Output format of the log lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "batchzip")]
#[command(about = "Streams batches of stored files to clients as zip archives")]
#[command(version)]
pub struct Cli {
    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    #[serde(default)]
    pub log_format: LogFormat,

    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration.
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Manifest backend, object store and archive configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads the `.env` file (if enabled) and parses CLI arguments.
    ///
    /// The file is loaded first so clap's `env` fallbacks can see its values.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with `RUST_LOG` filtering (default `info`).
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        let result = match self.log_format {
            LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init(),
        };

        result.context("failed to initialize tracing")
    }

    /// Validates server and middleware configuration.
    ///
    /// Service settings are validated when the state is created so that only
    /// the selected backend is checked.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")
    }

    /// Logs configuration without credentials.
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        match self.service.manifest_backend {
            ManifestBackend::Postgres => tracing::info!(
                target: TRACING_TARGET_CONFIG,
                backend = %self.service.manifest_backend,
                postgres_max_connections = self.service.postgres_config.postgres_max_connections,
                postgres_connection_timeout_secs = ?self.service.postgres_config.postgres_connection_timeout_secs,
                postgres_idle_timeout_secs = ?self.service.postgres_config.postgres_idle_timeout_secs,
                "Manifest backend configuration"
            ),
            ManifestBackend::Nats => tracing::info!(
                target: TRACING_TARGET_CONFIG,
                backend = %self.service.manifest_backend,
                nats_client_name = ?self.service.nats_config.nats_client_name,
                "Manifest backend configuration"
            ),
        }

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            bucket = %self.service.s3_config.aws_bucket,
            region = %self.service.s3_config.aws_region,
            custom_endpoint = self.service.s3_config.aws_endpoint.is_some(),
            fetch_timeout_secs = ?self.service.archive_config.fetch_timeout_secs,
            archive_channel_capacity = self.service.archive_config.archive_channel_capacity,
            "Object store configuration"
        );
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            dotenv = cfg!(feature = "dotenv"),
            "Build information"
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "batchzip",
            "--port",
            "9000",
            "--log-format",
            "json",
            "--manifest-backend",
            "nats",
            "--aws-bucket",
            "uploads",
            "--request-timeout",
            "45",
        ])
        .unwrap();

        assert_eq!(cli.server.port, 9000);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.service.manifest_backend, ManifestBackend::Nats);
        assert_eq!(cli.service.s3_config.aws_bucket, "uploads");
        assert_eq!(cli.middleware.recovery.request_timeout, 45);
    }
}
