//! Stream types that flow between stages, relays and sinks.
//!
//! ```text
//!   StageInput ──▶ Stage ──▶ (StageStream out, StageStream err)
//!                               │                 │
//!                               ▼                 ▼
//!                         next StageInput    StreamRelay ──▶ OutputSink
//! ```

use std::fs::File;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};
use tokio::process::{ChildStderr, ChildStdout};

/// A readable stream produced by a stage.
///
/// Process pipes stay OS pipes so they can be handed straight to the next
/// process; builtin output is an in-memory buffer read once.
#[derive(Debug)]
pub enum StageStream {
    /// Standard output of a spawned process.
    Stdout(ChildStdout),
    /// Standard error of a spawned process.
    Stderr(ChildStderr),
    /// Complete in-memory contents.
    Buffer(Cursor<Vec<u8>>),
}

impl StageStream {
    /// Stream that yields `data` and then ends.
    pub fn buffer(data: impl Into<Vec<u8>>) -> Self {
        StageStream::Buffer(Cursor::new(data.into()))
    }

    /// Stream that ends immediately.
    pub fn empty() -> Self {
        Self::buffer(Vec::new())
    }
}

impl AsyncRead for StageStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            StageStream::Stdout(s) => Pin::new(s).poll_read(cx, buf),
            StageStream::Stderr(s) => Pin::new(s).poll_read(cx, buf),
            StageStream::Buffer(c) => Pin::new(c).poll_read(cx, buf),
        }
    }
}

/// What a stage reads from.
#[derive(Debug)]
pub enum StageInput {
    /// The controlling process's standard input.
    Inherit,
    /// Nothing: reads see end-of-data immediately.
    Null,
    /// An input redirect file.
    File(File),
    /// Output of the upstream stage.
    Stream(StageStream),
}

/// How the first stage of a pipeline gets input when nothing is redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdinMode {
    /// Share the controlling process's standard input.
    #[default]
    Inherit,
    /// Detach: the first stage sees an empty input.
    Null,
}

impl StdinMode {
    pub(crate) fn input(self) -> StageInput {
        match self {
            StdinMode::Inherit => StageInput::Inherit,
            StdinMode::Null => StageInput::Null,
        }
    }
}

/// Destination of a relay.
///
/// Sinks are shared: every stage's error relay writes into the same
/// stderr sink. Each write call is atomic with respect to other writes to a
/// `File` or `Capture` sink; writes to the controlling stdout/stderr may
/// interleave with other writers at any granularity.
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    /// The controlling process's standard output.
    Stdout,
    /// The controlling process's standard error.
    Stderr,
    /// An opened output redirect file.
    File(Arc<tokio::sync::Mutex<tokio::fs::File>>),
    /// In-memory capture.
    Capture(CaptureBuffer),
    /// Discard everything.
    #[default]
    Null,
}

impl OutputSink {
    /// Sink writing into an already opened file.
    pub fn file(file: File) -> Self {
        OutputSink::File(Arc::new(tokio::sync::Mutex::new(tokio::fs::File::from_std(file))))
    }

    /// The capture buffer behind this sink, if it is one.
    pub fn capture(&self) -> Option<&CaptureBuffer> {
        match self {
            OutputSink::Capture(capture) => Some(capture),
            _ => None,
        }
    }

    /// Write and flush `data`.
    pub async fn write_all(&self, data: &[u8]) -> io::Result<()> {
        match self {
            OutputSink::Stdout => {
                let mut out = tokio::io::stdout();
                out.write_all(data).await?;
                out.flush().await
            }
            OutputSink::Stderr => {
                let mut err = tokio::io::stderr();
                err.write_all(data).await?;
                err.flush().await
            }
            OutputSink::File(file) => {
                let mut file = file.lock().await;
                file.write_all(data).await?;
                file.flush().await
            }
            OutputSink::Capture(capture) => capture.write(data),
            OutputSink::Null => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct CaptureInner {
    data: Vec<u8>,
    closed: bool,
}

/// Growable in-memory sink, cloneable across relays.
///
/// Closing the buffer makes further writes fail with `BrokenPipe`, the same
/// way a closed pipe or file would.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<CaptureInner>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `data`, or fail if the buffer has been closed.
    pub fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "capture closed"));
        }
        inner.data.extend_from_slice(data);
        Ok(())
    }

    /// Reject all further writes.
    pub fn close(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).closed = true;
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).data.clone()
    }

    /// Contents decoded as UTF-8, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Discard captured data.
    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn buffer_stream_reads_once() {
        let mut stream = StageStream::buffer("hello\n");
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello\n");

        out.clear();
        stream.read_to_string(&mut out).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn capture_rejects_writes_after_close() {
        let capture = CaptureBuffer::new();
        let sink = OutputSink::Capture(capture.clone());
        sink.write_all(b"a").await.unwrap();
        capture.close();
        let err = sink.write_all(b"b").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(capture.to_string_lossy(), "a");
    }

    #[tokio::test]
    async fn file_sink_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = OutputSink::file(File::create(&path).unwrap());
        sink.write_all(b"one\n").await.unwrap();
        sink.write_all(b"two\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
