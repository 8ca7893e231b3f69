#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for object fetches.
pub const TRACING_TARGET_FETCH: &str = "batchzip_object::fetch";

/// Tracing target for store construction and reachability checks.
pub const TRACING_TARGET_CONNECTION: &str = "batchzip_object::connection";

mod client;
mod config;
mod error;

pub use client::ObjectStoreClient;
pub use config::S3Config;
pub use error::{ObjectError, ObjectResult};
