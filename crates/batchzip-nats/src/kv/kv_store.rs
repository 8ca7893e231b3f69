//! Typed handle over one JetStream key-value bucket.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use async_nats::jetstream::{self, kv};
use bytes::Bytes;

use super::{KvBucket, KvKey};
use crate::{Error, Result, TRACING_TARGET_KV};

/// Bucket `B` addressed by keys of type `K`.
///
/// Values are opaque bytes. Each stored value is the raw payload written by
/// whoever prepared it.
pub struct KvStore<K, B> {
    store: kv::Store,
    marker: PhantomData<fn() -> (K, B)>,
}

impl<K, B> Clone for KvStore<K, B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            marker: PhantomData,
        }
    }
}

impl<K, B> fmt::Debug for KvStore<K, B>
where
    B: KvBucket,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvStore").field("bucket", &B::NAME).finish()
    }
}

impl<K, B> KvStore<K, B>
where
    K: KvKey,
    B: KvBucket,
{
    /// Binds to the bucket, creating it with `ttl` when it does not exist yet.
    ///
    /// An existing bucket keeps its own TTL.
    pub(crate) async fn open(jetstream: &jetstream::Context, ttl: Option<Duration>) -> Result<Self> {
        let store = match jetstream.get_key_value(B::NAME).await {
            Ok(store) => store,
            Err(lookup) => {
                let max_age = ttl.or(B::TTL).unwrap_or_default();
                tracing::info!(
                    target: TRACING_TARGET_KV,
                    bucket = B::NAME,
                    reason = %lookup,
                    max_age_secs = max_age.as_secs(),
                    "Creating KV bucket"
                );

                jetstream
                    .create_key_value(kv::Config {
                        bucket: B::NAME.to_owned(),
                        description: B::DESCRIPTION.to_owned(),
                        max_age,
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| Error::kv("create", e))?
            }
        };

        Ok(Self {
            store,
            marker: PhantomData,
        })
    }

    /// Returns the bucket name.
    #[inline]
    pub fn bucket_name(&self) -> &'static str {
        B::NAME
    }

    /// Returns the stored payload, or `None` when the key is absent or deleted.
    pub async fn get(&self, key: &K) -> Result<Option<Bytes>> {
        let key = key.to_string();
        let value = self
            .store
            .get(&key)
            .await
            .map_err(|e| Error::kv("get", e))?;

        tracing::trace!(
            target: TRACING_TARGET_KV,
            bucket = B::NAME,
            key = %key,
            hit = value.is_some(),
            size_bytes = value.as_ref().map_or(0, Bytes::len),
            "KV lookup"
        );

        Ok(value)
    }

    /// Stores `value` under `key` and returns the new revision.
    pub async fn put(&self, key: &K, value: Bytes) -> Result<u64> {
        let key = key.to_string();
        let size_bytes = value.len();
        let revision = self
            .store
            .put(&key, value)
            .await
            .map_err(|e| Error::kv("put", e))?;

        tracing::debug!(
            target: TRACING_TARGET_KV,
            bucket = B::NAME,
            key = %key,
            revision,
            size_bytes,
            "KV value stored"
        );

        Ok(revision)
    }
}
