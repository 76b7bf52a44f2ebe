//! # uart-sniffer
//!
//! Streaming frame detector for reverse-engineering an unknown UART protocol.
//!
//! Raw serial reads arrive in chunks that can split a frame anywhere. The
//! [`Detector`] buffers them and cuts the stream into frames using an ordered
//! catalog of observed shapes:
//!
//! - **Fixed-size frames**: `30 36 26` header, 28 bytes, `CE FE` or `CE FF`
//!   terminator
//! - **Partial frames**: the same header with a truncated body
//! - **Single-byte control codes**: `00 01 02 FC FE FF`, recognised by context
//!
//! [`PatternCatalog::canonical_with_packets`] adds the LCD side's
//! variable-length `BE ... FE` packets.
//!
//! Bytes that fit nothing are dropped one at a time so the detector always
//! regains sync. Every byte is accounted for in exactly one frame or in
//! [`Stats::bytes_dropped`].
//!
//! The detector performs no I/O. [`reader::FrameReader`] adapts any
//! `tokio::io::AsyncRead` for callers that want a ready-made read loop.
//!
//! ## Example
//!
//! ```
//! use uart_sniffer::{Detector, FrameKind};
//!
//! let mut detector = Detector::new();
//!
//! let frames = detector.feed(&[0x02]);
//! assert_eq!(frames[0].kind, FrameKind::SingleByte);
//! assert_eq!(frames[0].analysis.to_string(), "Acknowledgment");
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod reader;

mod detector;
mod stats;

pub use config::DetectorConfig;
pub use detector::{Detector, DetectorBuilder};
pub use error::SnifferError;
pub use protocol::{Frame, FrameAnalysis, FrameKind, PartialPolicy, PatternCatalog};
pub use stats::Stats;
