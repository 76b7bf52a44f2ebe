//! Async chunk reader.
//!
//! [`FrameReader`] drives a [`Detector`] from any `tokio::io::AsyncRead`
//! (a serial port handle, a capture file, a socket). It only reads and
//! feeds; port setup and everything downstream of the frames stays with the
//! caller.
//!
//! # Example
//!
//! ```
//! use uart_sniffer::reader::FrameReader;
//! use uart_sniffer::Detector;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let capture: &[u8] = &[0x99, 0x02];
//! let mut reader = FrameReader::new(capture, Detector::new());
//!
//! let mut frames = Vec::new();
//! while let Some(batch) = reader.next_frames().await? {
//!     frames.extend(batch);
//! }
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(reader.detector().stats().bytes_dropped, 1);
//! # Ok(())
//! # }
//! ```

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::detector::Detector;
use crate::error::Result;
use crate::protocol::Frame;

/// Reads chunks from `R` and turns them into frames.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    detector: Detector,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap `reader`, using the detector's configured read buffer size.
    pub fn new(reader: R, detector: Detector) -> Self {
        let size = detector.config().read_buffer_size.max(1);
        Self {
            reader,
            detector,
            buf: vec![0u8; size],
            finished: false,
        }
    }

    /// Read one chunk and return the frames it produced.
    ///
    /// A chunk that completes no frame yields an empty batch. At end of
    /// input the detector is drained once and its final frames returned;
    /// every call after that returns `Ok(None)`.
    pub async fn next_frames(&mut self) -> Result<Option<Vec<Frame>>> {
        if self.finished {
            return Ok(None);
        }

        let n = self.reader.read(&mut self.buf).await?;

        if n == 0 {
            self.finished = true;
            let frames = self.detector.finish();
            tracing::debug!(
                "End of input: {} final frame(s), stats {}",
                frames.len(),
                self.detector.stats().to_json()
            );
            return Ok(Some(frames));
        }

        Ok(Some(self.detector.feed(&self.buf[..n])))
    }

    /// Read to end of input, collecting every frame.
    pub async fn read_all(&mut self) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        while let Some(batch) = self.next_frames().await? {
            frames.extend(batch);
        }
        Ok(frames)
    }

    #[inline]
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Give back the detector and the underlying reader.
    pub fn into_inner(self) -> (R, Detector) {
        (self.reader, self.detector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnifferError;
    use crate::protocol::FrameKind;

    fn standard() -> Vec<u8> {
        let mut bytes = vec![0x30, 0x36, 0x26];
        bytes.extend_from_slice(&[0x11; 22]);
        bytes.extend_from_slice(&[0x30, 0xCE, 0xFE]);
        bytes
    }

    #[tokio::test]
    async fn test_small_chunks_reassemble_frame() {
        let detector = Detector::builder().read_buffer_size(5).build().unwrap();
        let data = standard();
        let mut reader = FrameReader::new(&data[..], detector);

        let frames = reader.read_all().await.unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Standard);
    }

    #[tokio::test]
    async fn test_finish_runs_once_at_eof() {
        let data = standard();
        let mut reader = FrameReader::new(&data[..15], Detector::new());

        assert_eq!(reader.next_frames().await.unwrap(), Some(Vec::new()));

        let last = reader.next_frames().await.unwrap().unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].kind, FrameKind::Partial);

        assert_eq!(reader.next_frames().await.unwrap(), None);
        assert_eq!(reader.detector().pending(), 0);
    }

    #[tokio::test]
    async fn test_read_error_surfaces_as_io() {
        let failing = failing_reader();
        let mut reader = FrameReader::new(failing, Detector::new());

        let err = reader.next_frames().await.unwrap_err();
        assert!(matches!(err, SnifferError::Io(_)));
    }

    /// A reader whose first read fails.
    fn failing_reader() -> impl AsyncRead + Unpin {
        struct Failing;

        impl AsyncRead for Failing {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "port unplugged",
                )))
            }
        }

        Failing
    }
}
