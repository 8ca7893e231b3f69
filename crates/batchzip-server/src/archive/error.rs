//! Archive encoding errors.

use std::io;

/// Result type for archive operations.
pub type ArchiveResult<T, E = ArchiveError> = std::result::Result<T, E>;

/// Failure while encoding or delivering the archive.
///
/// Every variant is fatal for the archive: the remaining entries are
/// abandoned and the response body ends early.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The zip encoder rejected an operation.
    #[error("zip encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing into the encoder failed.
    #[error("archive i/o failed: {0}")]
    Io(#[from] io::Error),

    /// The receiving side of the sink is gone (the client disconnected).
    #[error("client disconnected")]
    Disconnected,
}

impl ArchiveError {
    /// Returns whether the failure was caused by the client going away.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}
