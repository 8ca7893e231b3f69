//! [`Error`], [`ErrorKind`] and [`Result`].

mod http_error;
mod resolve_error;

pub use http_error::{Error, ErrorKind, Result};
