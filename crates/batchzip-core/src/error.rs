//! Common error type definitions.

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source of backend failures so that the collaborator traits
/// stay independent of any concrete database, cache or storage client.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;
