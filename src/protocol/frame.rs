//! Frame struct with typed accessors.
//!
//! A frame is one classified unit cut from the byte stream. The payload is
//! the exact run of consumed bytes, header and terminator included, shared
//! zero-copy via `bytes::Bytes`.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use uart_sniffer::protocol::{Frame, FrameKind};
//!
//! let frame = Frame::new(FrameKind::SingleByte, Bytes::from_static(&[0x02]), 0);
//! assert_eq!(frame.len(), 1);
//! assert_eq!(frame.analysis.to_string(), "Acknowledgment");
//! ```

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use super::analysis::{analyze, FrameAnalysis};
use super::catalog::FRAME_HEADER;

/// Category of an emitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameKind {
    /// Complete frame with the standard terminator.
    Standard,
    /// Complete frame with the error terminator.
    ErrorTerminated,
    /// Header seen, terminator never confirmed.
    Partial,
    /// Standalone control byte.
    SingleByte,
    /// Variable-length packet between a start and an end marker.
    Delimited,
}

impl FrameKind {
    /// Stable tag used in logs and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Standard => "standard",
            FrameKind::ErrorTerminated => "error-terminated",
            FrameKind::Partial => "partial",
            FrameKind::SingleByte => "single-byte",
            FrameKind::Delimited => "delimited",
        }
    }

    /// Complete, terminator-confirmed frame.
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            FrameKind::Standard | FrameKind::ErrorTerminated | FrameKind::Delimited
        )
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Frame category.
    pub kind: FrameKind,
    /// Consumed bytes (zero-copy via `bytes::Bytes`).
    #[serde(serialize_with = "serialize_hex")]
    pub payload: Bytes,
    /// Stream position of the first payload byte.
    pub offset: u64,
    /// Decoded fields for this frame.
    pub analysis: FrameAnalysis,
}

impl Frame {
    /// Create a frame and annotate it, assuming the canonical header.
    pub fn new(kind: FrameKind, payload: Bytes, offset: u64) -> Self {
        Self::with_header(kind, payload, offset, &FRAME_HEADER)
    }

    /// Create a frame whose pattern expects `header`.
    pub fn with_header(kind: FrameKind, payload: Bytes, offset: u64, header: &[u8]) -> Self {
        let analysis = analyze(kind, &payload, header);
        Self {
            kind,
            payload,
            offset,
            analysis,
        }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of bytes this frame consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Stream position one past the last payload byte.
    #[inline]
    pub fn end_offset(&self) -> u64 {
        self.offset + self.payload.len() as u64
    }

    /// Upper-case hex rendering of the payload, for logs.
    pub fn hex(&self) -> String {
        hex::encode_upper(&self.payload)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} bytes @ {}): {}",
            self.kind,
            self.hex(),
            self.len(),
            self.offset,
            self.analysis
        )
    }
}

fn serialize_hex<S: serde::Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode_upper(bytes))
}
