//! Key-value bucket configuration traits.

use std::time::Duration;

/// Marker trait for KV bucket configuration.
pub trait KvBucket: Clone + Send + Sync + 'static {
    /// Bucket name used in NATS KV.
    const NAME: &'static str;

    /// Human-readable description for the bucket.
    const DESCRIPTION: &'static str;

    /// Default TTL for entries in this bucket.
    /// Returns `None` for buckets where entries should not expire.
    const TTL: Option<Duration>;
}

/// Bucket for prepared batch download manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BatchDownloadsBucket;

impl KvBucket for BatchDownloadsBucket {
    const NAME: &'static str = "batch_downloads";
    const DESCRIPTION: &'static str = "Prepared batch download manifests";
    const TTL: Option<Duration> = Some(Duration::from_secs(24 * 60 * 60)); // 24 hours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_downloads_bucket() {
        assert_eq!(BatchDownloadsBucket::NAME, "batch_downloads");
        assert_eq!(
            BatchDownloadsBucket::TTL,
            Some(Duration::from_secs(24 * 60 * 60))
        );
    }
}
