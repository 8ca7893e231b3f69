#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the per-request download summary.
pub const TRACING_TARGET_DOWNLOAD: &str = "batchzip_server::handler::download";

/// Tracing target for archive assembly (per-entry skips and failures).
pub const TRACING_TARGET_ASSEMBLY: &str = "batchzip_server::service::assembly";

/// Tracing target for archive encoding.
pub const TRACING_TARGET_ARCHIVE: &str = "batchzip_server::archive";

/// Tracing target for service startup and collaborator connections.
pub const TRACING_TARGET_SERVICE: &str = "batchzip_server::service";

pub mod archive;
pub mod handler;
pub mod middleware;
pub mod service;
