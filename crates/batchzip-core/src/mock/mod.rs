//! In-memory collaborator doubles for testing.
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! batchzip-core = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use batchzip_core::mock::{MockFetcher, MockResolver};
//!
//! let resolver = MockResolver::new()
//!     .with_payload("abc", r#"[{"S3Path":"k1","FileName":"a.txt"}]"#);
//! let fetcher = MockFetcher::new().with_object("k1", "hello");
//! ```

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::StreamExt;
use futures::stream;

use crate::{
    BlobFetcher, BlobStream, FetchError, Manifest, ManifestResolver, ResolveError,
    TRACING_TARGET_MOCK,
};

#[derive(Debug, Clone)]
enum MockRecord {
    Payload(String),
    BackendError(String),
}

/// Resolver backed by a fixed map of token to raw JSON payload.
///
/// Unknown tokens and empty payloads resolve to [`ResolveError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    records: Arc<HashMap<String, MockRecord>>,
    calls: Arc<AtomicUsize>,
}

impl MockResolver {
    /// Creates a resolver that knows no tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw JSON payload under `token`.
    pub fn with_payload(self, token: impl Into<String>, payload: impl Into<String>) -> Self {
        self.with_record(token.into(), MockRecord::Payload(payload.into()))
    }

    /// Makes `token` fail with a backend error carrying `message`.
    pub fn with_backend_error(self, token: impl Into<String>, message: impl Into<String>) -> Self {
        self.with_record(token.into(), MockRecord::BackendError(message.into()))
    }

    /// Returns how many times [`ManifestResolver::resolve`] was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn with_record(self, token: String, record: MockRecord) -> Self {
        let mut records = Arc::unwrap_or_clone(self.records);
        records.insert(token, record);
        Self {
            records: Arc::new(records),
            calls: self.calls,
        }
    }
}

#[async_trait::async_trait]
impl ManifestResolver for MockResolver {
    async fn resolve(&self, token: &str) -> Result<Manifest, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(target: TRACING_TARGET_MOCK, token, "Resolving mock manifest");

        match self.records.get(token) {
            None => Err(ResolveError::NotFound),
            Some(MockRecord::Payload(payload)) if payload.is_empty() => Err(ResolveError::NotFound),
            Some(MockRecord::Payload(payload)) => Ok(Manifest::from_json(payload)?),
            Some(MockRecord::BackendError(message)) => {
                Err(ResolveError::backend(message.clone()))
            }
        }
    }
}

/// Behaviour of one key in a [`MockFetcher`].
#[derive(Debug, Clone)]
pub enum MockObject {
    /// The object body, yielded chunk by chunk.
    Chunks(Vec<Bytes>),
    /// Opening the object fails with [`FetchError::Other`].
    Failure(String),
    /// Opening the object never completes.
    Stall,
    /// The body yields these chunks and then fails with an I/O error.
    BrokenAfter(Vec<Bytes>),
    /// The body yields these chunks and then never produces another.
    StallAfter(Vec<Bytes>),
}

/// Fetcher backed by a fixed map of key to [`MockObject`].
///
/// Keys that were never registered fail with [`FetchError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    objects: Arc<HashMap<String, MockObject>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Creates a fetcher with no objects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `body` under `key` as a single chunk.
    pub fn with_object(self, key: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.with(key, MockObject::Chunks(vec![body.into()]))
    }

    /// Stores `chunks` under `key`.
    pub fn with_chunks<I, B>(self, key: impl Into<String>, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks = chunks.into_iter().map(Into::into).collect();
        self.with(key, MockObject::Chunks(chunks))
    }

    /// Makes opening `key` fail with `message`.
    pub fn with_failure(self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.with(key, MockObject::Failure(message.into()))
    }

    /// Makes opening `key` hang forever.
    pub fn with_stall(self, key: impl Into<String>) -> Self {
        self.with(key, MockObject::Stall)
    }

    /// Stores `key` with an arbitrary behaviour.
    pub fn with(self, key: impl Into<String>, object: MockObject) -> Self {
        let mut objects = Arc::unwrap_or_clone(self.objects);
        objects.insert(key.into(), object);
        Self {
            objects: Arc::new(objects),
            fetched: self.fetched,
        }
    }

    /// Returns every key passed to [`BlobFetcher::fetch`], in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }

    /// Returns how many times [`BlobFetcher::fetch`] was called.
    pub fn calls(&self) -> usize {
        self.fetched.lock().map(|keys| keys.len()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl BlobFetcher for MockFetcher {
    async fn fetch(&self, key: &str) -> Result<BlobStream, FetchError> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(key.to_owned());
        }
        tracing::trace!(target: TRACING_TARGET_MOCK, key, "Fetching mock object");

        match self.objects.get(key) {
            None => Err(FetchError::not_found(key)),
            Some(MockObject::Failure(message)) => Err(FetchError::other(key, message.clone())),
            Some(MockObject::Stall) => {
                futures::future::pending::<()>().await;
                Err(FetchError::other(key, "stalled fetch resumed"))
            }
            Some(MockObject::Chunks(chunks)) => {
                Ok(stream::iter(chunks.clone().into_iter().map(Ok)).boxed())
            }
            Some(MockObject::BrokenAfter(chunks)) => {
                let broken = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
                let body = chunks
                    .clone()
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(broken)));
                Ok(stream::iter(body).boxed())
            }
            Some(MockObject::StallAfter(chunks)) => {
                let body = stream::iter(chunks.clone().into_iter().map(Ok)).chain(stream::pending());
                Ok(body.boxed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use futures::FutureExt;

    use super::*;

    #[tokio::test]
    async fn resolver_classifies_tokens() {
        let resolver = MockResolver::new()
            .with_payload("ok", "[]")
            .with_payload("empty", "")
            .with_payload("bad", "{")
            .with_backend_error("down", "connection refused");

        assert!(resolver.resolve("ok").await.unwrap().is_empty());
        assert!(matches!(resolver.resolve("empty").await, Err(ResolveError::NotFound)));
        assert!(matches!(resolver.resolve("missing").await, Err(ResolveError::NotFound)));
        assert!(matches!(resolver.resolve("bad").await, Err(ResolveError::Decode(_))));
        assert!(matches!(resolver.resolve("down").await, Err(ResolveError::Backend(_))));
        assert_eq!(resolver.calls(), 5);
    }

    #[tokio::test]
    async fn fetcher_streams_chunks() {
        let fetcher = MockFetcher::new().with_chunks("k", ["ab", "cd"]);
        let body: Vec<Bytes> = fetcher.fetch("k").await.unwrap().try_collect().await.unwrap();
        assert_eq!(body, vec![Bytes::from("ab"), Bytes::from("cd")]);
        assert_eq!(fetcher.fetched(), vec!["k".to_owned()]);
    }

    #[tokio::test]
    async fn fetcher_classifies_failures() {
        let fetcher = MockFetcher::new()
            .with_failure("bad", "access denied")
            .with("broken", MockObject::BrokenAfter(vec![Bytes::from("ab")]));

        assert!(fetcher.fetch("missing").await.err().unwrap().is_not_found());
        assert!(!fetcher.fetch("bad").await.err().unwrap().is_not_found());

        let mut body = fetcher.fetch("broken").await.unwrap();
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from("ab"));
        assert!(body.next().await.unwrap().is_err());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn stalled_body_stops_after_its_chunks() {
        let fetcher = MockFetcher::new().with("slow", MockObject::StallAfter(vec![Bytes::from("ab")]));

        let mut body = fetcher.fetch("slow").await.unwrap();
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from("ab"));
        assert!(body.next().now_or_never().is_none());
    }
}
