//! Service configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use batchzip_core::{SharedFetcher, SharedResolver};
use batchzip_nats::{NatsClient, NatsConfig};
use batchzip_object::{ObjectStoreClient, S3Config};
use batchzip_postgres::{PgClient, PgConfig};
#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_SERVICE;
use crate::service::{ArchiveAssembler, Result, ServiceError};

/// Store the manifest resolver reads from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ManifestBackend {
    /// `batch_downloads` table in Postgres.
    #[default]
    Postgres,
    /// `batch_downloads` key-value bucket in NATS JetStream.
    Nats,
}

impl fmt::Display for ManifestBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => f.write_str("postgres"),
            Self::Nats => f.write_str("nats"),
        }
    }
}

/// Archive streaming settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ArchiveConfig {
    /// Seconds allowed for opening each object and for each chunk read (unset: no limit)
    #[cfg_attr(
        feature = "config",
        arg(long = "fetch-timeout-secs", env = "FETCH_TIMEOUT_SECS")
    )]
    pub fetch_timeout_secs: Option<u64>,

    /// Number of compressed chunks buffered ahead of a slow client
    #[cfg_attr(
        feature = "config",
        arg(
            long = "archive-channel-capacity",
            env = "ARCHIVE_CHANNEL_CAPACITY",
            default_value_t = ArchiveAssembler::DEFAULT_CHANNEL_CAPACITY
        )
    )]
    #[serde(default = "default_channel_capacity")]
    pub archive_channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    ArchiveAssembler::DEFAULT_CHANNEL_CAPACITY
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: None,
            archive_channel_capacity: default_channel_capacity(),
        }
    }
}

impl ArchiveConfig {
    /// Returns the per-fetch timeout, if any.
    #[inline]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_secs == Some(0) {
            return Err(ServiceError::config(
                "Fetch timeout must be at least one second when set",
            ));
        }

        if self.archive_channel_capacity == 0 {
            return Err(ServiceError::config(
                "Archive channel capacity must be at least 1",
            ));
        }

        Ok(())
    }

    /// Builds the archive pipeline over `fetcher`.
    pub fn assembler(&self, fetcher: SharedFetcher) -> ArchiveAssembler {
        ArchiveAssembler::new(fetcher)
            .with_fetch_timeout(self.fetch_timeout())
            .with_channel_capacity(self.archive_channel_capacity)
    }
}

/// App [`state`] configuration.
///
/// Only the collaborators of the selected [`ManifestBackend`] are connected;
/// the settings of the other backend are parsed but never used.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Store manifests are resolved from
    #[cfg_attr(
        feature = "config",
        arg(
            long = "manifest-backend",
            env = "MANIFEST_BACKEND",
            value_enum,
            default_value = "postgres"
        )
    )]
    #[serde(default)]
    pub manifest_backend: ManifestBackend,

    /// Manifest database settings.
    #[cfg_attr(feature = "config", command(flatten))]
    pub postgres_config: PgConfig,

    /// Manifest cache settings.
    #[cfg_attr(feature = "config", command(flatten))]
    pub nats_config: NatsConfig,

    /// Object store settings.
    #[cfg_attr(feature = "config", command(flatten))]
    pub s3_config: S3Config,

    /// Archive streaming settings.
    #[cfg_attr(feature = "config", command(flatten))]
    pub archive_config: ArchiveConfig,
}

impl ServiceConfig {
    /// Creates a configuration with default settings for everything but the
    /// bucket.
    pub fn new(manifest_backend: ManifestBackend, s3_config: S3Config) -> Self {
        Self {
            manifest_backend,
            postgres_config: PgConfig::new(batchzip_postgres::DEFAULT_DATABASE_URL),
            nats_config: NatsConfig::new(batchzip_nats::DEFAULT_NATS_URL),
            s3_config,
            archive_config: ArchiveConfig::default(),
        }
    }

    /// Validates the selected backend, the object store and archive settings.
    pub fn validate(&self) -> Result<()> {
        match self.manifest_backend {
            ManifestBackend::Postgres => self
                .postgres_config
                .validate()
                .map_err(|e| ServiceError::config_with_source("Invalid Postgres configuration", e))?,
            ManifestBackend::Nats => self
                .nats_config
                .validate()
                .map_err(|e| ServiceError::config_with_source("Invalid NATS configuration", e))?,
        }

        self.s3_config
            .validate()
            .map_err(|e| ServiceError::config_with_source("Invalid object store configuration", e))?;

        self.archive_config.validate()
    }

    /// Connects the manifest resolver of the selected backend.
    pub async fn connect_resolver(&self) -> Result<SharedResolver> {
        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            backend = %self.manifest_backend,
            "Connecting manifest resolver"
        );

        let resolver: SharedResolver = match self.manifest_backend {
            ManifestBackend::Postgres => Arc::new(self.connect_postgres().await?),
            ManifestBackend::Nats => {
                let nats = self.connect_nats().await?;
                let cache = nats.manifest_cache().await.map_err(|e| {
                    ServiceError::cache_with_source("Failed to open the manifest bucket", e)
                })?;
                Arc::new(cache)
            }
        };

        Ok(resolver)
    }

    /// Connects to Postgres and verifies the pool with a test query.
    pub async fn connect_postgres(&self) -> Result<PgClient> {
        PgClient::new_with_test(self.postgres_config.clone())
            .await
            .map_err(|e| ServiceError::database_with_source("Failed to connect to Postgres", e))
    }

    /// Connects to NATS and waits for one server round trip.
    pub async fn connect_nats(&self) -> Result<NatsClient> {
        let nats = NatsClient::connect(self.nats_config.clone())
            .await
            .map_err(|e| ServiceError::cache_with_source("Failed to connect to NATS", e))?;

        let rtt = nats
            .ping()
            .await
            .map_err(|e| ServiceError::cache_with_source("NATS did not answer a flush", e))?;
        tracing::debug!(target: TRACING_TARGET_SERVICE, rtt = ?rtt, "NATS reachable");

        Ok(nats)
    }

    /// Builds the object store client and checks that the bucket answers.
    pub async fn connect_object_store(&self) -> Result<ObjectStoreClient> {
        let client = self.s3_config.connect().map_err(|e| {
            ServiceError::object_store_with_source("Failed to create object store client", e)
        })?;

        client.verify_reachable().await.map_err(|e| {
            ServiceError::object_store_with_source("Object store is unreachable", e)
        })?;

        Ok(client)
    }

    /// Connects the blob fetcher.
    pub async fn connect_fetcher(&self) -> Result<SharedFetcher> {
        Ok(Arc::new(self.connect_object_store().await?))
    }
}
