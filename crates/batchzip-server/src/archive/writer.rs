//! Sequential zip writer over an [`ArchiveSink`].

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use jiff::civil;
use zip::write::{SimpleFileOptions, StreamWriter};
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::{ArchiveResult, ArchiveSink, headers};
use crate::TRACING_TARGET_ARCHIVE;

/// Encoder output, drained into the sink after every operation.
#[derive(Debug, Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> io::Result<Vec<u8>> {
        let mut buffer = self
            .0
            .lock()
            .map_err(|_| io::Error::other("archive buffer poisoned"))?;
        Ok(std::mem::take(&mut *buffer))
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("archive buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Append-only zip writer bound to one response.
///
/// Entries are deflated and written with data descriptors, so the sink never
/// needs to seek. Every entry name is flagged as UTF-8 in both its local
/// and central directory header.
///
/// ```rust,ignore
/// let (sink, body) = ArchiveSink::channel(16);
/// let mut writer = ArchiveWriter::open(sink);
///
/// let mut entry = writer.append_entry("docs/a.txt", None).await?;
/// entry.write_all(b"hello").await?;
/// entry.close().await?;
///
/// writer.finalize().await?;
/// ```
pub struct ArchiveWriter {
    zip: ZipWriter<StreamWriter<SharedBuffer>>,
    buffer: SharedBuffer,
    sink: ArchiveSink,
    sent: u64,
    entries: usize,
}

impl ArchiveWriter {
    /// Starts an empty archive. Nothing is sent until the first entry.
    pub fn open(sink: ArchiveSink) -> Self {
        let buffer = SharedBuffer::default();
        Self {
            zip: ZipWriter::new_stream(buffer.clone()),
            buffer,
            sink,
            sent: 0,
            entries: 0,
        }
    }

    /// Begins a new entry at `path`.
    ///
    /// Without `modified` the entry carries the zip baseline time
    /// (1980-01-01 00:00:00).
    pub async fn append_entry(
        &mut self,
        path: &str,
        modified: Option<civil::DateTime>,
    ) -> ArchiveResult<EntryWriter<'_>> {
        self.zip.start_file(path, entry_options(modified))?;

        let mut chunk = self.buffer.take()?;
        if !headers::flag_local_header(&mut chunk, path.as_bytes()) {
            tracing::warn!(
                target: TRACING_TARGET_ARCHIVE,
                path,
                "Local header not found, entry left without UTF-8 flag"
            );
        }
        self.send(chunk).await?;

        tracing::trace!(target: TRACING_TARGET_ARCHIVE, path, "Started archive entry");
        Ok(EntryWriter {
            archive: self,
            written: 0,
        })
    }

    /// Writes the central directory and sends the remaining bytes.
    ///
    /// Valid with zero entries, which produces an empty archive.
    pub async fn finalize(self) -> ArchiveResult<usize> {
        let Self {
            zip,
            buffer,
            sink,
            sent,
            entries,
        } = self;

        zip.finish()?;

        let mut trailer = buffer.take()?;
        match headers::flag_central_directory(&mut trailer, sent) {
            Some(flagged) if flagged == entries => {}
            flagged => tracing::warn!(
                target: TRACING_TARGET_ARCHIVE,
                entries,
                ?flagged,
                "Central directory only partially flagged as UTF-8"
            ),
        }
        if !trailer.is_empty() {
            sink.send(Bytes::from(trailer)).await?;
        }

        tracing::trace!(target: TRACING_TARGET_ARCHIVE, entries, "Finalized archive");
        Ok(entries)
    }

    async fn drain(&mut self) -> ArchiveResult<()> {
        let chunk = self.buffer.take()?;
        self.send(chunk).await
    }

    async fn send(&mut self, chunk: Vec<u8>) -> ArchiveResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.sent += chunk.len() as u64;
        self.sink.send(Bytes::from(chunk)).await
    }
}

/// Body of the entry most recently started on an [`ArchiveWriter`].
///
/// The writer stays borrowed until [`EntryWriter::close`] is called.
pub struct EntryWriter<'a> {
    archive: &'a mut ArchiveWriter,
    written: u64,
}

impl EntryWriter<'_> {
    /// Compresses `chunk` into the entry and forwards any output.
    pub async fn write_all(&mut self, chunk: &[u8]) -> ArchiveResult<()> {
        self.archive.zip.write_all(chunk)?;
        self.written += chunk.len() as u64;
        self.archive.drain().await
    }

    /// Returns the uncompressed bytes written so far.
    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Ends the entry. Its sizes and checksum are emitted in the data
    /// descriptor that precedes the next entry or the trailer.
    pub async fn close(self) -> ArchiveResult<u64> {
        self.archive.drain().await?;
        self.archive.entries += 1;
        Ok(self.written)
    }
}

fn entry_options(modified: Option<civil::DateTime>) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip_timestamp(modified))
}

/// Converts to DOS time, falling back to the baseline outside 1980..=2107.
fn zip_timestamp(modified: Option<civil::DateTime>) -> DateTime {
    modified
        .and_then(|modified| {
            DateTime::from_date_and_time(
                u16::try_from(modified.year()).ok()?,
                u8::try_from(modified.month()).ok()?,
                u8::try_from(modified.day()).ok()?,
                u8::try_from(modified.hour()).ok()?,
                u8::try_from(modified.minute()).ok()?,
                u8::try_from(modified.second()).ok()?,
            )
            .ok()
        })
        .unwrap_or_default()
}
