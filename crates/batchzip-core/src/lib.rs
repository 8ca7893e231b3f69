#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for manifest decoding.
pub const TRACING_TARGET_MANIFEST: &str = "batchzip_core::manifest";

/// Tracing target for collaborator test doubles.
#[cfg(feature = "test-utils")]
pub const TRACING_TARGET_MOCK: &str = "batchzip_core::mock";

mod error;
mod fetcher;
pub mod manifest;
pub mod path;
mod resolver;
mod timestamp;

#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use error::BoxedError;
pub use fetcher::{BlobFetcher, BlobStream, FetchError, SharedFetcher};
pub use manifest::{Manifest, ManifestDecodeError, ManifestEntry};
pub use path::{build_archive_path, sanitize};
pub use resolver::{ManifestResolver, ResolveError, SharedResolver};
pub use timestamp::{MODIFIED_FORMAT, TimestampError, parse_modified};
