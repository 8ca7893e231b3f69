//! Manifest to archive pipeline.

use std::io;
use std::time::Duration;

use batchzip_core::{
    BlobStream, FetchError, Manifest, ManifestEntry, SharedFetcher, build_archive_path,
    parse_modified,
};
use bytes::Bytes;
use futures::StreamExt;
use jiff::civil;

use crate::TRACING_TARGET_ASSEMBLY;
use crate::archive::{ArchiveError, ArchiveResult, ArchiveSink, ArchiveWriter};

/// Outcome counts of one assembled archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Entries written to the archive, truncated ones included.
    pub written: usize,
    /// Entries left out (no remote path, or the fetch failed).
    pub skipped: usize,
    /// Written entries whose source stream ended in an error.
    pub truncated: usize,
}

/// Streams the objects named by a manifest into an archive.
///
/// Entries are processed strictly in manifest order, one fetch at a time.
/// Duplicate archive paths are written as they come; readers resolve them by
/// position.
#[derive(Clone)]
pub struct ArchiveAssembler {
    fetcher: SharedFetcher,
    fetch_timeout: Option<Duration>,
    channel_capacity: usize,
}

impl ArchiveAssembler {
    /// Default number of chunks buffered between the writer and the client.
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

    /// Creates an assembler reading objects through `fetcher`.
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self {
            fetcher,
            fetch_timeout: None,
            channel_capacity: Self::DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Bounds opening each object and reading each of its chunks.
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets how many chunks may be queued for the client.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Returns the queue size to use for [`ArchiveSink::channel`].
    #[inline]
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    /// Writes every usable entry of `manifest` into `sink` and finalizes the
    /// archive.
    ///
    /// Entry-level failures are logged and skipped. The only error returned
    /// is an archive failure, most commonly [`ArchiveError::Disconnected`],
    /// which is detected even while a fetch is stalled. The in-flight object
    /// stream and the writer are dropped on return.
    pub async fn assemble(
        &self,
        manifest: Manifest,
        sink: ArchiveSink,
    ) -> ArchiveResult<AssemblyReport> {
        let mut report = AssemblyReport::default();
        let mut writer = ArchiveWriter::open(sink.clone());

        for entry in manifest {
            if !entry.has_remote_path() {
                tracing::warn!(
                    target: TRACING_TARGET_ASSEMBLY,
                    file_id = entry.file_id,
                    file_name = %entry.file_name,
                    "Missing path for file"
                );
                report.skipped += 1;
                continue;
            }

            let opened = tokio::select! {
                biased;
                () = sink.closed() => return Err(ArchiveError::Disconnected),
                opened = self.open(&entry.remote_path) => opened,
            };

            let mut body = match opened {
                Ok(body) => body,
                Err(err) => {
                    log_fetch_error(&entry, &err);
                    report.skipped += 1;
                    continue;
                }
            };

            let path = build_archive_path(&entry);
            let mut file = writer.append_entry(&path, modified_time(&entry)).await?;

            loop {
                let next = tokio::select! {
                    biased;
                    () = sink.closed() => return Err(ArchiveError::Disconnected),
                    next = self.next_chunk(&mut body) => next,
                };

                match next {
                    None => break,
                    Some(Ok(chunk)) => file.write_all(&chunk).await?,
                    Some(Err(err)) => {
                        tracing::warn!(
                            target: TRACING_TARGET_ASSEMBLY,
                            key = %entry.remote_path,
                            path = %path,
                            written = file.written(),
                            error = %err,
                            "Error reading file, entry truncated"
                        );
                        report.truncated += 1;
                        break;
                    }
                }
            }

            file.close().await?;
            report.written += 1;
        }

        writer.finalize().await?;
        Ok(report)
    }

    async fn open(&self, key: &str) -> Result<BlobStream, FetchError> {
        let Some(limit) = self.fetch_timeout else {
            return self.fetcher.fetch(key).await;
        };

        match tokio::time::timeout(limit, self.fetcher.fetch(key)).await {
            Ok(opened) => opened,
            Err(_) => Err(FetchError::other(
                key,
                format!("timed out after {}s", limit.as_secs()),
            )),
        }
    }

    async fn next_chunk(&self, body: &mut BlobStream) -> Option<io::Result<Bytes>> {
        let Some(limit) = self.fetch_timeout else {
            return body.next().await;
        };

        match tokio::time::timeout(limit, body.next()).await {
            Ok(next) => next,
            Err(_) => Some(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no data for {}s", limit.as_secs()),
            ))),
        }
    }
}

impl std::fmt::Debug for ArchiveAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveAssembler")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("channel_capacity", &self.channel_capacity)
            .finish_non_exhaustive()
    }
}

fn log_fetch_error(entry: &ManifestEntry, err: &FetchError) {
    if err.is_not_found() {
        tracing::warn!(
            target: TRACING_TARGET_ASSEMBLY,
            key = %err.key(),
            file_id = entry.file_id,
            "File not found in storage"
        );
    } else {
        tracing::error!(
            target: TRACING_TARGET_ASSEMBLY,
            key = %err.key(),
            file_id = entry.file_id,
            error = %err,
            "Error downloading file"
        );
    }
}

fn modified_time(entry: &ManifestEntry) -> Option<civil::DateTime> {
    let raw = entry.modified.as_deref()?;
    match parse_modified(raw) {
        Ok(modified) => Some(modified),
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET_ASSEMBLY,
                file_id = entry.file_id,
                modified = raw,
                error = %err,
                "Unparseable modification time, using default"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};
    use std::sync::Arc;

    use batchzip_core::mock::{MockFetcher, MockObject};
    use futures::StreamExt;
    use zip::ZipArchive;

    use super::*;
    use crate::archive::ArchiveBody;

    fn entry(remote_path: &str, file_name: &str) -> ManifestEntry {
        ManifestEntry {
            remote_path: remote_path.to_owned(),
            file_name: file_name.to_owned(),
            ..ManifestEntry::default()
        }
    }

    async fn run(
        assembler: &ArchiveAssembler,
        manifest: Manifest,
    ) -> (AssemblyReport, ZipArchive<Cursor<Vec<u8>>>) {
        let (sink, mut body): (ArchiveSink, ArchiveBody) = ArchiveSink::channel(4);
        let assembler = assembler.clone();
        let task = tokio::spawn(async move { assembler.assemble(manifest, sink).await });

        let mut bytes = Vec::new();
        while let Some(chunk) = body.next().await {
            bytes.extend_from_slice(&chunk.unwrap());
        }

        let report = task.await.unwrap().unwrap();
        (report, ZipArchive::new(Cursor::new(bytes)).unwrap())
    }

    fn names(archive: &mut ZipArchive<Cursor<Vec<u8>>>) -> Vec<String> {
        (0..archive.len())
            .map(|index| archive.by_index(index).unwrap().name().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn skips_entries_without_remote_path() {
        let fetcher = MockFetcher::new().with_object("k2", "second");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher.clone()));

        let manifest = Manifest::new(vec![entry("", "first.txt"), entry("k2", "second.txt")]);
        let (report, mut archive) = run(&assembler, manifest).await;

        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(fetcher.fetched(), vec!["k2".to_owned()]);

        let mut contents = String::new();
        archive
            .by_name("second.txt")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "second");
    }

    #[tokio::test]
    async fn failed_fetches_are_skipped() {
        let fetcher = MockFetcher::new()
            .with_failure("k2", "access denied")
            .with_object("k3", "three")
            .with_object("k4", "four");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher));

        let manifest = Manifest::new(vec![
            entry("k1", "one.txt"),
            entry("k2", "two.txt"),
            entry("k3", "three.txt"),
            entry("k4", "four.txt"),
        ]);
        let (report, mut archive) = run(&assembler, manifest).await;

        assert_eq!(report.written, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(names(&mut archive), vec!["three.txt", "four.txt"]);
    }

    #[tokio::test]
    async fn broken_stream_keeps_partial_entry() {
        let fetcher = MockFetcher::new()
            .with("k1", MockObject::BrokenAfter(vec![Bytes::from_static(b"par")]))
            .with_object("k2", "whole");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher));

        let manifest = Manifest::new(vec![entry("k1", "partial.txt"), entry("k2", "whole.txt")]);
        let (report, mut archive) = run(&assembler, manifest).await;

        assert_eq!(report.written, 2);
        assert_eq!(report.truncated, 1);

        let mut contents = String::new();
        archive
            .by_name("partial.txt")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "par");
    }

    #[tokio::test]
    async fn invalid_modified_time_does_not_fail_entry() {
        let fetcher = MockFetcher::new().with_object("k1", "body");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher));

        let mut undated = entry("k1", "a.txt");
        undated.modified = Some("not-a-date".to_owned());
        let (report, mut archive) = run(&assembler, Manifest::new(vec![undated])).await;

        assert_eq!(report.written, 1);
        assert_eq!(names(&mut archive), vec!["a.txt"]);
        assert_eq!(
            archive.by_index(0).unwrap().last_modified(),
            Some(zip::DateTime::default())
        );
    }

    #[tokio::test]
    async fn modified_time_is_stamped_on_entry() {
        let fetcher = MockFetcher::new().with_object("k1", "body");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher));

        let mut dated = entry("k1", "a.txt");
        dated.modified = Some("2015-07-18T02:05:04Z".to_owned());
        let (_, mut archive) = run(&assembler, Manifest::new(vec![dated])).await;

        let expected = zip::DateTime::from_date_and_time(2015, 7, 18, 2, 5, 4).unwrap();
        assert_eq!(archive.by_index(0).unwrap().last_modified(), Some(expected));
    }

    #[tokio::test]
    async fn project_entries_use_prefixed_paths() {
        let fetcher = MockFetcher::new().with_object("k1", "img");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher));

        let manifest = Manifest::new(vec![ManifestEntry {
            remote_path: "k1".to_owned(),
            file_name: "a<1>.jpg".to_owned(),
            folder: "Level 1/Level 2".to_owned(),
            project_id: 23216,
            project_name: "Super:man".to_owned(),
            ..ManifestEntry::default()
        }]);
        let (_, mut archive) = run(&assembler, manifest).await;

        assert_eq!(names(&mut archive), vec!["23216.Superman/Level 1/Level 2/a1.jpg"]);
    }

    #[tokio::test]
    async fn empty_manifest_yields_empty_archive() {
        let assembler = ArchiveAssembler::new(Arc::new(MockFetcher::new()));
        let (report, archive) = run(&assembler, Manifest::default()).await;

        assert_eq!(report, AssemblyReport::default());
        assert_eq!(archive.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_fetch_times_out() {
        let fetcher = MockFetcher::new()
            .with_stall("k1")
            .with_object("k2", "after");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher))
            .with_fetch_timeout(Some(Duration::from_secs(5)));

        let manifest = Manifest::new(vec![entry("k1", "stalled.txt"), entry("k2", "after.txt")]);
        let (report, mut archive) = run(&assembler, manifest).await;

        assert_eq!(report.skipped, 1);
        assert_eq!(names(&mut archive), vec!["after.txt"]);
    }

    #[tokio::test]
    async fn disconnect_aborts_stalled_fetch() {
        let fetcher = MockFetcher::new().with_stall("k1");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher));

        let (sink, body) = ArchiveSink::channel(4);
        drop(body);

        let manifest = Manifest::new(vec![entry("k1", "stalled.txt")]);
        let err = assembler.assemble(manifest, sink).await.unwrap_err();
        assert!(err.is_disconnected());
    }

    #[tokio::test]
    async fn disconnect_mid_entry_stops_assembly() {
        let fetcher = MockFetcher::new()
            .with("k1", MockObject::StallAfter(vec![Bytes::from_static(b"head")]))
            .with_object("k2", "never read");
        let assembler = ArchiveAssembler::new(Arc::new(fetcher.clone()));

        let (sink, mut body) = ArchiveSink::channel(4);
        let manifest = Manifest::new(vec![entry("k1", "first.txt"), entry("k2", "second.txt")]);
        let task = tokio::spawn(async move { assembler.assemble(manifest, sink).await });

        assert!(body.next().await.unwrap().is_ok());
        drop(body);

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ArchiveError::Disconnected));
        assert_eq!(fetcher.fetched(), vec!["k1".to_owned()]);
    }
}
