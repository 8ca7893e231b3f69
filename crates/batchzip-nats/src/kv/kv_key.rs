//! Key-value key types and traits.

use std::fmt;

use crate::Error;

/// Marker trait for KV key types; `Display` renders the full stored key.
pub trait KvKey: fmt::Debug + fmt::Display + Clone + Send + Sync + 'static {}

/// Key of a prepared batch download, rendered as `batch_download.<token>`.
///
/// Tokens may only contain ASCII letters, digits, `_`, `-` and `=`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchDownloadKey(String);

impl BatchDownloadKey {
    const PREFIX: &'static str = "batch_download.";

    /// Creates a key for `token`, rejecting tokens that are not valid key material.
    pub fn new(token: &str) -> Result<Self, Error> {
        if Self::is_valid_token(token) {
            Ok(Self(token.to_owned()))
        } else {
            Err(Error::InvalidKey(token.to_owned()))
        }
    }

    /// Returns whether `token` can be embedded in a KV key.
    pub fn is_valid_token(token: &str) -> bool {
        !token.is_empty()
            && token
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'='))
    }
}

impl KvKey for BatchDownloadKey {}

impl fmt::Display for BatchDownloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_namespaced_key() {
        let key = BatchDownloadKey::new("abc123").unwrap();
        assert_eq!(key.to_string(), "batch_download.abc123");
    }

    #[test]
    fn test_accepts_token_punctuation() {
        let key = BatchDownloadKey::new("a-b_c=").unwrap();
        assert_eq!(key.to_string(), "batch_download.a-b_c=");
    }

    #[test]
    fn test_rejects_invalid_tokens() {
        for token in ["", "a b", "a.b", "a/b", "a*", "ünïcode", "a>b"] {
            assert!(BatchDownloadKey::new(token).is_err(), "{token:?}");
        }
    }
}
