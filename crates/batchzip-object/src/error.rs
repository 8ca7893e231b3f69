//! Errors raised while building or probing an object store.

/// Result type for object-store setup operations.
pub type ObjectResult<T, E = ObjectError> = Result<T, E>;

/// Object-store setup failure.
///
/// Per-object fetch failures are reported as [`batchzip_core::FetchError`]
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// The configuration is incomplete or inconsistent.
    #[error("object store configuration error: {0}")]
    Config(String),

    /// The store client could not be constructed.
    #[error("failed to build object store client: {0}")]
    Build(#[source] object_store::Error),

    /// The store did not answer the reachability check.
    #[error("object store is unreachable: {0}")]
    Unreachable(#[source] object_store::Error),
}
