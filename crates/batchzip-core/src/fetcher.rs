//! Remote object fetching contract.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::BoxedError;

/// Lazily read object body. Errors mid-stream surface as [`io::Error`].
pub type BlobStream = BoxStream<'static, io::Result<Bytes>>;

/// Shared, type-erased [`BlobFetcher`] handle.
pub type SharedFetcher = Arc<dyn BlobFetcher>;

/// Opens byte streams for object-store keys.
///
/// Implementations must not buffer whole objects. Every failure is returned
/// as a classified [`FetchError`]; skipping the entry is up to the caller.
#[async_trait::async_trait]
pub trait BlobFetcher: Send + Sync + 'static {
    /// Opens the object stored under `key`.
    async fn fetch(&self, key: &str) -> Result<BlobStream, FetchError>;
}

#[async_trait::async_trait]
impl<T> BlobFetcher for Arc<T>
where
    T: BlobFetcher + ?Sized,
{
    async fn fetch(&self, key: &str) -> Result<BlobStream, FetchError> {
        (**self).fetch(key).await
    }
}

/// Classified fetch failure.
///
/// Both variants are handled identically by the caller; they differ only in
/// how they are logged.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The key does not exist in the store.
    #[error("object '{key}' was not found")]
    NotFound { key: String },

    /// Any other failure (network, permissions, timeout).
    #[error("error downloading object '{key}': {source}")]
    Other {
        key: String,
        #[source]
        source: BoxedError,
    },
}

impl FetchError {
    /// Creates a [`FetchError::NotFound`].
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a [`FetchError::Other`].
    pub fn other(key: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::Other {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Returns the key the failure relates to.
    pub fn key(&self) -> &str {
        match self {
            Self::NotFound { key } | Self::Other { key, .. } => key,
        }
    }

    /// Returns whether the object is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
