//! NATS Key-Value store operations.
//!
//! - `KvStore<K, B>`: raw-bytes key-value operations over one bucket
//! - `KvKey`: trait for key types with namespace prefix
//! - `KvBucket`: trait for bucket configuration
//!
//! # Example
//!
//! ```ignore
//! let store: KvStore<BatchDownloadKey, BatchDownloadsBucket> =
//!     nats_client.kv_store(None).await?;
//!
//! let key = BatchDownloadKey::new("abc123")?;
//! let revision = store.put(&key, payload).await?;
//! let payload = store.get(&key).await?;
//! ```

mod kv_bucket;
mod kv_key;
mod kv_store;

pub use kv_bucket::{BatchDownloadsBucket, KvBucket};
pub use kv_key::{BatchDownloadKey, KvKey};
pub use kv_store::KvStore;
