//! Manifest resolver backed by the `batch_downloads` KV bucket.

use batchzip_core::{Manifest, ManifestResolver, ResolveError};
use bytes::Bytes;

use crate::kv::{BatchDownloadKey, BatchDownloadsBucket, KvStore};
use crate::{Result, TRACING_TARGET_KV};

/// Reads (and seeds) manifests stored as raw JSON under `batch_download.<token>`.
#[derive(Clone)]
pub struct ManifestCache {
    store: KvStore<BatchDownloadKey, BatchDownloadsBucket>,
}

impl ManifestCache {
    /// Wraps an opened bucket.
    pub fn new(store: KvStore<BatchDownloadKey, BatchDownloadsBucket>) -> Self {
        Self { store }
    }

    /// Stores a raw manifest payload under `token` and returns its revision.
    ///
    /// Entries expire with the bucket TTL.
    pub async fn put(&self, token: &str, payload: impl Into<Bytes>) -> Result<u64> {
        let key = BatchDownloadKey::new(token)?;
        self.store.put(&key, payload.into()).await
    }
}

impl std::fmt::Debug for ManifestCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestCache")
            .field("bucket", &self.store.bucket_name())
            .finish()
    }
}

#[async_trait::async_trait]
impl ManifestResolver for ManifestCache {
    async fn resolve(&self, token: &str) -> std::result::Result<Manifest, ResolveError> {
        let Ok(key) = BatchDownloadKey::new(token) else {
            tracing::debug!(target: TRACING_TARGET_KV, "Token is not valid key material");
            return Err(ResolveError::NotFound);
        };

        let payload = self.store.get(&key).await.map_err(ResolveError::backend)?;
        decode_payload(payload)
    }
}

/// Classifies a stored value: absent or empty is `NotFound`, anything else is decoded.
fn decode_payload(payload: Option<Bytes>) -> std::result::Result<Manifest, ResolveError> {
    match payload {
        Some(bytes) if !bytes.is_empty() => {
            Ok(Manifest::from_json(&String::from_utf8_lossy(&bytes))?)
        }
        _ => Err(ResolveError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_payload_is_not_found() {
        assert!(matches!(decode_payload(None), Err(ResolveError::NotFound)));
        assert!(matches!(
            decode_payload(Some(Bytes::new())),
            Err(ResolveError::NotFound)
        ));
    }

    #[test]
    fn payload_is_decoded_as_manifest() {
        let payload = Bytes::from_static(br#"[{"S3Path":"k","FileName":"a.txt","FileId":"1"}]"#);
        let manifest = decode_payload(Some(payload)).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries()[0].remote_path, "k");
    }

    #[test]
    fn garbage_payload_is_decode_error() {
        let err = decode_payload(Some(Bytes::from_static(b"not json"))).unwrap_err();
        assert_eq!(err.client_message(), "Error decoding json: not json");
    }
}
