//! Background drains from a stage stream into a sink.
//!
//! Every live stream gets its own relay task the moment it exists, so no
//! process ever blocks on a full pipe that nobody reads.
//!
//! ```text
//!   Stage 1 err ──▶ relay ──┐
//!   Stage 2 err ──▶ relay ──┼──▶ OutputSink::Stderr
//!   Stage 3 err ──▶ relay ──┘
//!   Stage 3 out ──▶ relay ─────▶ OutputSink::Stdout | File
//! ```
//!
//! A relay copies line by line and checks its stop signal between lines.
//! Once stopped (or at end-of-data) it drains whatever remains in fixed-size
//! chunks, so stopping never drops bytes that the source still delivers.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::stream::OutputSink;

const CHUNK_SIZE: usize = 8192;

/// Handle to a running relay task.
#[derive(Debug)]
pub struct StreamRelay {
    label: String,
    stop: CancellationToken,
    handle: JoinHandle<u64>,
}

impl StreamRelay {
    /// Start draining `source` into `sink` on a new task.
    ///
    /// `label` only appears in logs.
    pub fn start<R>(label: impl Into<String>, source: R, sink: OutputSink) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let label = label.into();
        let stop = CancellationToken::new();
        let handle = tokio::spawn(relay(label.clone(), source, sink, stop.clone()));
        Self { label, stop, handle }
    }

    /// Ask the relay to stop at its next line boundary.
    ///
    /// Does not interrupt a read in progress.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// True once the relay task has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the relay to end and return the number of bytes it wrote.
    pub async fn join(self) -> u64 {
        match self.handle.await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(relay = %self.label, "relay task failed: {}", e);
                0
            }
        }
    }
}

async fn relay<R>(label: String, source: R, sink: OutputSink, stop: CancellationToken) -> u64
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut written: u64 = 0;
    let mut line = Vec::new();

    while !stop.is_cancelled() {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = sink.write_all(&line).await {
                    tracing::debug!(relay = %label, written, "sink closed: {}", e);
                    return written;
                }
                written += n as u64;
            }
            Err(e) => {
                tracing::debug!(relay = %label, written, "source read failed: {}", e);
                return written;
            }
        }
    }

    // Drain the remainder (including anything buffered by the line reader).
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = sink.write_all(&chunk[..n]).await {
                    tracing::debug!(relay = %label, written, "sink closed: {}", e);
                    return written;
                }
                written += n as u64;
            }
            Err(e) => {
                tracing::debug!(relay = %label, written, "source read failed: {}", e);
                break;
            }
        }
    }

    tracing::debug!(relay = %label, written, "relay finished");
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::stream::{CaptureBuffer, StageStream};
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn relays_everything_until_end_of_data() {
        let capture = CaptureBuffer::new();
        let relay = StreamRelay::start(
            "test",
            StageStream::buffer("one\ntwo\nno newline"),
            OutputSink::Capture(capture.clone()),
        );
        assert_eq!(relay.join().await, 18);
        assert_eq!(capture.to_string_lossy(), "one\ntwo\nno newline");
    }

    #[tokio::test]
    async fn stop_before_data_still_drains_remainder() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let capture = CaptureBuffer::new();
        let relay = StreamRelay::start("test", rx, OutputSink::Capture(capture.clone()));

        relay.stop();
        tx.write_all(b"late line\nand tail").await.unwrap();
        drop(tx);

        relay.join().await;
        assert_eq!(capture.to_string_lossy(), "late line\nand tail");
    }

    #[tokio::test]
    async fn closed_sink_ends_relay_quietly() {
        let capture = CaptureBuffer::new();
        capture.close();
        let relay = StreamRelay::start(
            "test",
            StageStream::buffer("dropped\n"),
            OutputSink::Capture(capture.clone()),
        );
        assert_eq!(relay.join().await, 0);
        assert!(capture.contents().is_empty());
    }

    #[tokio::test]
    async fn relays_sharing_a_sink_keep_their_own_order() {
        let capture = CaptureBuffer::new();
        let a = StreamRelay::start(
            "a",
            StageStream::buffer("a1\na2\na3\n"),
            OutputSink::Capture(capture.clone()),
        );
        let b = StreamRelay::start(
            "b",
            StageStream::buffer("b1\nb2\nb3\n"),
            OutputSink::Capture(capture.clone()),
        );
        a.join().await;
        b.join().await;

        let text = capture.to_string_lossy();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        let a_lines: Vec<_> = lines.iter().filter(|l| l.starts_with('a')).collect();
        let b_lines: Vec<_> = lines.iter().filter(|l| l.starts_with('b')).collect();
        assert_eq!(a_lines, vec![&"a1", &"a2", &"a3"]);
        assert_eq!(b_lines, vec![&"b1", &"b2", &"b3"]);
    }

    #[tokio::test]
    async fn non_utf8_bytes_pass_through() {
        let capture = CaptureBuffer::new();
        let relay = StreamRelay::start(
            "test",
            StageStream::buffer(vec![0xff, 0xfe, b'\n', 0x00]),
            OutputSink::Capture(capture.clone()),
        );
        relay.join().await;
        assert_eq!(capture.contents(), vec![0xff, 0xfe, b'\n', 0x00]);
    }
}
