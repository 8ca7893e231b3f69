//! Shared NATS connection.
//!
//! `async-nats` multiplexes everything over one connection and reconnects by
//! itself, so the process holds a single [`NatsClient`] and clones it.

use std::time::{Duration, Instant};

use async_nats::{Client, jetstream};
use tokio::time::timeout;

use super::nats_config::NatsConfig;
use crate::kv::{BatchDownloadKey, BatchDownloadsBucket, KvBucket, KvKey, KvStore};
use crate::{Error, ManifestCache, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Connected client plus its JetStream context.
#[derive(Debug, Clone)]
pub struct NatsClient {
    client: Client,
    jetstream: jetstream::Context,
}

impl NatsClient {
    /// Validates `config` and connects, bounded by its connect timeout.
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        config.validate()?;

        let started = Instant::now();
        let limit = config.connect_timeout();
        let client = timeout(
            limit,
            async_nats::connect_with_options(config.nats_url.as_str(), config.connect_options()),
        )
        .await
        .map_err(|_| Error::Timeout(limit))?
        .map_err(|e| Error::Connection(Box::new(e)))?;

        let info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            servers = %config.nats_url,
            server_id = %info.server_id,
            version = %info.version,
            elapsed = ?started.elapsed(),
            "Connected to NATS"
        );

        Ok(Self {
            jetstream: jetstream::new(client.clone()),
            client,
        })
    }

    /// Flushes pending writes and returns the round-trip time.
    pub async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        timeout(FLUSH_TIMEOUT, self.client.flush())
            .await
            .map_err(|_| Error::Timeout(FLUSH_TIMEOUT))?
            .map_err(|e| Error::Connection(Box::new(e)))?;

        let rtt = started.elapsed();
        tracing::trace!(target: TRACING_TARGET_CLIENT, rtt = ?rtt, "NATS flush");
        Ok(rtt)
    }

    /// Opens bucket `B`, creating it with `ttl` (or the bucket default) when missing.
    pub async fn kv_store<K, B>(&self, ttl: Option<Duration>) -> Result<KvStore<K, B>>
    where
        K: KvKey,
        B: KvBucket,
    {
        KvStore::open(&self.jetstream, ttl).await
    }

    /// Opens the manifest cache over the `batch_downloads` bucket.
    pub async fn manifest_cache(&self) -> Result<ManifestCache> {
        let store = self
            .kv_store::<BatchDownloadKey, BatchDownloadsBucket>(None)
            .await?;
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            bucket = BatchDownloadsBucket::NAME,
            "Manifest cache ready"
        );
        Ok(ManifestCache::new(store))
    }
}
