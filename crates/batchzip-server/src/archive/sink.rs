//! Channel-backed output for [`ArchiveWriter`].
//!
//! [`ArchiveWriter`]: super::ArchiveWriter

use std::io;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ArchiveError, ArchiveResult};

/// Receiving half of an archive channel, usable as an HTTP response body.
pub type ArchiveBody = ReceiverStream<io::Result<Bytes>>;

/// Sending half of an archive channel.
///
/// Cloning yields another handle to the same channel. The body ends once
/// every handle is dropped.
#[derive(Debug, Clone)]
pub struct ArchiveSink {
    sender: mpsc::Sender<io::Result<Bytes>>,
}

impl ArchiveSink {
    /// Creates a channel buffering up to `capacity` chunks.
    pub fn channel(capacity: usize) -> (Self, ArchiveBody) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, ReceiverStream::new(receiver))
    }

    /// Sends one chunk, waiting while the channel is full.
    pub async fn send(&self, chunk: Bytes) -> ArchiveResult<()> {
        self.sender
            .send(Ok(chunk))
            .await
            .map_err(|_| ArchiveError::Disconnected)
    }

    /// Completes once the receiving half has been dropped.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }

    /// Returns whether the receiving half has been dropped.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn chunks_arrive_in_order() {
        let (sink, mut body) = ArchiveSink::channel(4);
        sink.send(Bytes::from_static(b"ab")).await.unwrap();
        sink.send(Bytes::from_static(b"cd")).await.unwrap();
        drop(sink);

        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"ab"));
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"cd"));
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn dropped_body_disconnects() {
        let (sink, body) = ArchiveSink::channel(1);
        drop(body);

        assert!(sink.is_closed());
        sink.closed().await;
        let err = sink.send(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(err.is_disconnected());
    }
}
