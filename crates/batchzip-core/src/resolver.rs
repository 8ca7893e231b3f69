//! Manifest resolution contract.

use std::sync::Arc;

use crate::{BoxedError, Manifest, ManifestDecodeError};

/// Shared, type-erased [`ManifestResolver`] handle.
pub type SharedResolver = Arc<dyn ManifestResolver>;

/// Maps a reference token to the [`Manifest`] persisted under it.
///
/// Implementations perform exactly one lookup per call. A missing record, an
/// empty payload and an undecodable payload are all resolution failures; a
/// payload that decodes to zero entries is a success.
#[async_trait::async_trait]
pub trait ManifestResolver: Send + Sync + 'static {
    /// Resolves the manifest stored under `token`.
    async fn resolve(&self, token: &str) -> Result<Manifest, ResolveError>;
}

#[async_trait::async_trait]
impl<T> ManifestResolver for Arc<T>
where
    T: ManifestResolver + ?Sized,
{
    async fn resolve(&self, token: &str) -> Result<Manifest, ResolveError> {
        (**self).resolve(token).await
    }
}

/// Why a reference token could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No record, or an empty payload, is stored under the token.
    #[error("Could not find that batch download.")]
    NotFound,

    /// The stored payload is not a valid manifest.
    #[error(transparent)]
    Decode(#[from] ManifestDecodeError),

    /// The backing store could not be queried.
    #[error("manifest backend failure: {0}")]
    Backend(#[source] BoxedError),
}

impl ResolveError {
    /// Wraps a backend failure.
    pub fn backend(error: impl Into<BoxedError>) -> Self {
        Self::Backend(error.into())
    }

    /// Returns the message shown to the client.
    ///
    /// Backend failure details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::NotFound | Self::Decode(_) => self.to_string(),
            Self::Backend(_) => "Could not load that batch download.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages() {
        assert_eq!(
            ResolveError::NotFound.client_message(),
            "Could not find that batch download."
        );

        let decode = Manifest::from_json("oops").unwrap_err();
        assert_eq!(
            ResolveError::from(decode).client_message(),
            "Error decoding json: oops"
        );

        let backend = ResolveError::backend("connection refused");
        assert_eq!(backend.client_message(), "Could not load that batch download.");
        assert!(backend.to_string().contains("connection refused"));
    }
}
