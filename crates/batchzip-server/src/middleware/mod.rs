//! Middleware for `axum::Router`.
//!
//! - [`RouterObservabilityExt`]: request ids, tracing spans and request logs.
//! - [`RouterRecoveryExt`]: panics and timeouts become plaintext 500s.
//!
//! Apply observability first so recovered responses still carry a request id:
//!
//! ```rust,ignore
//! use batchzip_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
//!
//! let app = routes(state)
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod observability;
mod recovery;

pub use observability::{RouterObservabilityExt, log_requests};
pub use recovery::{RecoveryConfig, RouterRecoveryExt};

/// Tracing target for per-request logs.
pub const TRACING_TARGET_REQUEST: &str = "batchzip_server::middleware::request";

/// Tracing target for recovered middleware errors.
pub const TRACING_TARGET_RECOVERY: &str = "batchzip_server::middleware::recovery";
