//! Blob fetcher backed by [`object_store::ObjectStore`].

use std::io;
use std::sync::Arc;

use batchzip_core::{BlobFetcher, BlobStream, FetchError};
use derive_more::Deref;
use futures::{StreamExt, TryStreamExt};
use object_store::ObjectStore;
use object_store::path::Path;

use crate::{ObjectError, ObjectResult, TRACING_TARGET_CONNECTION, TRACING_TARGET_FETCH};

const REACHABILITY_KEY: &str = "_batchzip_reachability_check";

/// Cloneable handle to any [`ObjectStore`] backend.
///
/// Manifest keys are parsed with [`Path::parse`], so the store is asked for
/// exactly the key the manifest names. Keys that are not valid object paths
/// (empty segments, `.` or `..`) fail the fetch.
#[derive(Clone, Debug, Deref)]
pub struct ObjectStoreClient(Arc<dyn ObjectStore>);

impl ObjectStoreClient {
    /// Wraps a concrete [`ObjectStore`] implementation.
    pub fn new(store: impl ObjectStore) -> Self {
        Self(Arc::new(store))
    }

    /// Verifies that the backing store is reachable.
    ///
    /// A HEAD for a sentinel key that returns not-found counts as success.
    #[tracing::instrument(name = "object.verify", skip(self), target = TRACING_TARGET_CONNECTION)]
    pub async fn verify_reachable(&self) -> ObjectResult<()> {
        match self.0.head(&Path::from(REACHABILITY_KEY)).await {
            Ok(_) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(err) => Err(ObjectError::Unreachable(err)),
        }
    }
}

#[async_trait::async_trait]
impl BlobFetcher for ObjectStoreClient {
    async fn fetch(&self, key: &str) -> Result<BlobStream, FetchError> {
        let path = Path::parse(key).map_err(|err| FetchError::other(key, err))?;
        match self.0.get(&path).await {
            Ok(result) => {
                tracing::debug!(
                    target: TRACING_TARGET_FETCH,
                    key,
                    size = result.meta.size,
                    "Opened object"
                );
                Ok(result.into_stream().map_err(io::Error::other).boxed())
            }
            Err(object_store::Error::NotFound { .. }) => Err(FetchError::not_found(key)),
            Err(err) => Err(FetchError::other(key, err)),
        }
    }
}
