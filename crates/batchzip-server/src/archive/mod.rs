//! Streaming zip encoding.
//!
//! [`ArchiveWriter`] encodes entries one at a time and forwards compressed
//! bytes to an [`ArchiveSink`] as soon as they are produced. The sink is the
//! sending half of a bounded channel whose receiving half backs the HTTP
//! response body, so a slow client applies backpressure to the writer and a
//! disconnected client surfaces as [`ArchiveError::Disconnected`].

mod error;
mod headers;
mod sink;
mod writer;

pub use error::{ArchiveError, ArchiveResult};
pub use sink::{ArchiveBody, ArchiveSink};
pub use writer::{ArchiveWriter, EntryWriter};
