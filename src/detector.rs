//! Streaming frame detector.
//!
//! The [`Detector`] owns a [`FrameBuffer`], a [`PatternCatalog`] and running
//! [`Stats`]. Each `feed` call appends a chunk and then loops extraction
//! attempts over the front of the buffer:
//!
//! 1. The catalog is tried in priority order (`MatchOutcome`).
//! 2. `Matched` consumes the pattern's length and emits a frame.
//! 3. `Incomplete` stops the loop until more bytes arrive.
//! 4. `NoMatch` asks the single-byte classifier; a control byte is emitted
//!    as a one-byte frame, anything else is dropped to resynchronize.
//!
//! Every fed byte ends up in exactly one frame, in `bytes_dropped`, or still
//! pending in the buffer.
//!
//! # Example
//!
//! ```
//! use uart_sniffer::Detector;
//!
//! let mut detector = Detector::new();
//!
//! let mut frame = vec![0x30, 0x36, 0x26];
//! frame.extend_from_slice(&[0x00; 22]);
//! frame.extend_from_slice(&[0x30, 0xCE, 0xFE]);
//!
//! // Reads can split a frame anywhere
//! assert!(detector.feed(&frame[..10]).is_empty());
//! let frames = detector.feed(&frame[10..]);
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].len(), 28);
//! assert_eq!(detector.stats().frames_found, 1);
//! ```

use bytes::Bytes;

use crate::config::DetectorConfig;
use crate::error::{Result, SnifferError};
use crate::protocol::{
    ByteContext, ControlClassifier, Frame, FrameBuffer, FrameKind, MatchOutcome, PartialPolicy,
    Pattern, PatternCatalog, FRAME_HEADER,
};
use crate::stats::Stats;

/// Builder for configuring and creating a [`Detector`].
#[derive(Debug, Clone, Default)]
pub struct DetectorBuilder {
    catalog: PatternCatalog,
    config: DetectorConfig,
}

impl DetectorBuilder {
    /// Create a builder with the canonical catalog and default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom pattern catalog.
    pub fn catalog(mut self, catalog: PatternCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how partial patterns compete with incomplete fixed ones.
    ///
    /// Default: `PartialPolicy::Deferred`
    pub fn partial_policy(mut self, policy: PartialPolicy) -> Self {
        self.config.partial_policy = policy;
        self
    }

    /// Set the byte values after which a control byte may stand alone.
    pub fn boundary_markers(mut self, markers: impl Into<Vec<u8>>) -> Self {
        self.config.boundary_markers = markers.into();
        self
    }

    /// Cap the number of unclassified bytes kept in the buffer.
    ///
    /// Must be at least the catalog's longest pattern; `build` rejects a
    /// smaller cap.
    pub fn max_pending(mut self, limit: usize) -> Self {
        self.config.max_pending = Some(limit);
        self
    }

    /// Set the chunk size used by the async reader.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Validate the configuration and build the detector.
    pub fn build(self) -> Result<Detector> {
        self.config.validate()?;
        if let Some(limit) = self.config.max_pending {
            let longest = self.catalog.max_frame_len();
            if limit < longest {
                return Err(SnifferError::Config(format!(
                    "max_pending {} is shorter than the longest pattern ({} bytes)",
                    limit, longest
                )));
            }
        }
        Ok(Detector::from_parts(self.catalog, self.config))
    }
}

/// Streaming frame detector.
///
/// Not meant to be shared: every method that advances state takes `&mut self`.
/// Use one detector per byte stream.
#[derive(Debug)]
pub struct Detector {
    buffer: FrameBuffer,
    catalog: PatternCatalog,
    classifier: ControlClassifier,
    config: DetectorConfig,
    stats: Stats,
    /// Stream position of the first buffered byte.
    offset: u64,
    /// Last byte consumed into a frame or dropped.
    previous: Option<u8>,
}

impl Detector {
    /// Create a detector with the canonical catalog and default config.
    pub fn new() -> Self {
        Self::from_parts(PatternCatalog::canonical(), DetectorConfig::default())
    }

    /// Create a detector with the canonical catalog and a custom config.
    pub fn with_config(config: DetectorConfig) -> Result<Self> {
        DetectorBuilder::new().config(config).build()
    }

    /// Create a new builder.
    pub fn builder() -> DetectorBuilder {
        DetectorBuilder::new()
    }

    fn from_parts(catalog: PatternCatalog, config: DetectorConfig) -> Self {
        let classifier = ControlClassifier::new(catalog.control_bytes(), &config.boundary_markers);
        Self {
            buffer: FrameBuffer::new(),
            catalog,
            classifier,
            config,
            stats: Stats::default(),
            offset: 0,
            previous: None,
        }
    }

    /// Append a chunk and extract every frame it completes.
    ///
    /// Never fails: unrecognised data degrades to dropped bytes. Frames are
    /// returned in stream order. A zero-length chunk is a no-op.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        if data.is_empty() {
            return frames;
        }

        self.stats.total_bytes += data.len() as u64;
        self.buffer.append(data);
        self.extract(false, &mut frames);

        if let Some(limit) = self.config.max_pending {
            let excess = self.buffer.len().saturating_sub(limit);
            if excess > 0 {
                tracing::warn!(
                    "Pending bytes {} exceed limit {}, dropping {} oldest",
                    self.buffer.len(),
                    limit,
                    excess
                );
                self.drop_front(excess);
                self.extract(false, &mut frames);
            }
        }

        frames
    }

    /// Drain the buffer at end of stream.
    ///
    /// Bytes still waiting for a fixed frame to complete are re-examined as
    /// partial frames, control bytes or resync drops. Afterwards nothing is
    /// pending.
    pub fn finish(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        self.extract(true, &mut frames);
        frames
    }

    /// Snapshot of the running counters.
    #[inline]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Number of bytes buffered but not yet classified.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes buffered but not yet classified.
    #[inline]
    pub fn pending_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    #[inline]
    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn extract(&mut self, at_end: bool, frames: &mut Vec<Frame>) {
        while !self.buffer.is_empty() {
            let outcome =
                self.catalog
                    .try_match(self.buffer.as_slice(), self.config.partial_policy, at_end);

            match outcome {
                MatchOutcome::Matched { pattern, kind, len } => {
                    frames.push(self.take_frame(kind, len, Some(pattern)));
                }
                MatchOutcome::Incomplete => break,
                MatchOutcome::NoMatch => {
                    let Some(byte) = self.buffer.get(0) else {
                        break;
                    };
                    let ctx = ByteContext {
                        first_in_stream: self.offset == 0,
                        previous: self.previous,
                        next: self.buffer.get(1),
                    };
                    if self.classifier.classify(byte, ctx) {
                        frames.push(self.take_frame(FrameKind::SingleByte, 1, None));
                    } else {
                        self.drop_front(1);
                    }
                }
            }
        }
    }

    fn take_frame(&mut self, kind: FrameKind, len: usize, pattern: Option<usize>) -> Frame {
        debug_assert!(len <= self.buffer.len());
        let payload = self.buffer.take(len);
        let offset = self.advance(&payload);

        let header = pattern
            .and_then(|index| self.catalog.get(index))
            .map(Pattern::header)
            .unwrap_or(&FRAME_HEADER[..]);
        let frame = Frame::with_header(kind, payload, offset, header);

        self.stats.record_frame(kind);
        tracing::trace!(
            "{} frame at {} ({} bytes): {}",
            frame.kind,
            frame.offset,
            frame.len(),
            frame.hex()
        );
        frame
    }

    fn drop_front(&mut self, n: usize) {
        let dropped = self.buffer.take(n);
        let offset = self.advance(&dropped);
        self.stats.bytes_dropped += dropped.len() as u64;
        tracing::debug!(
            "Resync: dropped {} byte(s) at {}: {}",
            dropped.len(),
            offset,
            hex::encode_upper(&dropped)
        );
    }

    /// Move the stream cursor past `consumed`, returning its start offset.
    fn advance(&mut self, consumed: &Bytes) -> u64 {
        let start = self.offset;
        self.offset += consumed.len() as u64;
        if let Some(&last) = consumed.last() {
            self.previous = Some(last);
        }
        start
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        ControlPurpose, FrameAnalysis, PacketCommand, StatusMeaning, TerminatorClass,
        ERROR_TERMINATOR, STANDARD_TERMINATOR,
    };

    /// Helper to create a 28-byte frame with the given status and terminator.
    fn make_frame_bytes(status: u8, terminator: [u8; 2]) -> Vec<u8> {
        let mut bytes = FRAME_HEADER.to_vec();
        bytes.extend_from_slice(&[
            0x00, 0x0C, 0x30, 0x02, 0x00, 0xFC, 0x30, 0x00, 0x80, 0x32, 0x00, 0x32, 0x30, 0x00,
            0x30, 0x82, 0x40, 0x00, 0x30, 0x0E, 0x00, 0x00,
        ]);
        bytes.push(status);
        bytes.extend_from_slice(&terminator);
        bytes
    }

    fn standard() -> Vec<u8> {
        make_frame_bytes(0x30, STANDARD_TERMINATOR)
    }

    #[test]
    fn test_single_standard_frame() {
        let mut detector = Detector::new();
        let frames = detector.feed(&standard());

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Standard);
        assert_eq!(frames[0].len(), 28);
        match &frames[0].analysis {
            FrameAnalysis::Fixed(fixed) => {
                assert_eq!(fixed.terminator, TerminatorClass::Standard);
                assert_eq!(fixed.status, StatusMeaning::Normal);
            }
            other => panic!("unexpected analysis: {:?}", other),
        }
        assert_eq!(detector.pending(), 0);
    }

    #[test]
    fn test_error_terminated_frame() {
        let mut detector = Detector::new();
        let frames = detector.feed(&make_frame_bytes(0x30, ERROR_TERMINATOR));

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::ErrorTerminated);
        assert_eq!(detector.stats().error_frames, 1);
        assert_eq!(detector.stats().frames_found, 1);
    }

    #[test]
    fn test_isolated_ack() {
        let mut detector = Detector::new();
        let frames = detector.feed(&[0x02]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::SingleByte);
        match &frames[0].analysis {
            FrameAnalysis::SingleByte(control) => {
                assert_eq!(control.likely_purpose, ControlPurpose::Acknowledgment)
            }
            other => panic!("unexpected analysis: {:?}", other),
        }
    }

    #[test]
    fn test_resync_drops_garbage() {
        let mut detector = Detector::new();

        assert!(detector.feed(&[0x99]).is_empty());
        assert_eq!(detector.stats().bytes_dropped, 1);

        let frames = detector.feed(&standard());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Standard);
        assert_eq!(frames[0].offset, 1);
        assert_eq!(detector.stats().bytes_dropped, 1);
    }

    #[test]
    fn test_incomplete_header_waits() {
        let mut detector = Detector::new();
        let frames = detector.feed(&[0x30, 0x36]);

        assert!(frames.is_empty());
        assert_eq!(detector.stats().bytes_dropped, 0);
        assert_eq!(detector.pending_bytes(), &[0x30, 0x36]);
    }

    #[test]
    fn test_fragmented_frame() {
        let mut detector = Detector::new();
        let bytes = standard();

        assert!(detector.feed(&bytes[..2]).is_empty());
        assert!(detector.feed(&bytes[2..20]).is_empty());
        assert_eq!(detector.pending(), 20);

        let frames = detector.feed(&bytes[20..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &bytes[..]);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut detector = Detector::new();
        let bytes = standard();

        let mut all_frames = Vec::new();
        for byte in &bytes {
            all_frames.extend(detector.feed(&[*byte]));
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(all_frames[0].kind, FrameKind::Standard);
    }

    #[test]
    fn test_zero_length_feed_is_noop() {
        let mut detector = Detector::new();
        assert!(detector.feed(&[]).is_empty());
        assert_eq!(detector.stats(), Stats::default());
    }

    #[test]
    fn test_bad_terminator_becomes_partial() {
        let mut detector = Detector::new();
        let mut bytes = make_frame_bytes(0x30, [0xCE, 0x11]);
        bytes.push(0x55);

        let frames = detector.feed(&bytes);

        // 27 bytes as partial, then terminator tail 0x11 and 0x55 dropped
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Partial);
        assert_eq!(frames[0].len(), 27);
        assert_eq!(detector.stats().bytes_dropped, 2);
        assert_eq!(detector.pending(), 0);
    }

    #[test]
    fn test_eager_policy_cuts_partial_early() {
        let mut detector = Detector::builder()
            .partial_policy(PartialPolicy::Eager)
            .build()
            .unwrap();
        let bytes = standard();

        assert!(detector.feed(&bytes[..9]).is_empty());
        let frames = detector.feed(&bytes[9..12]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Partial);
        assert_eq!(frames[0].len(), 12);
    }

    #[test]
    fn test_deferred_policy_waits_for_full_size() {
        let mut detector = Detector::new();
        let bytes = standard();

        assert!(detector.feed(&bytes[..12]).is_empty());
        assert_eq!(detector.pending(), 12);
    }

    #[test]
    fn test_finish_drains_incomplete_frame_as_partial() {
        let mut detector = Detector::new();
        let bytes = standard();

        assert!(detector.feed(&bytes[..15]).is_empty());
        let frames = detector.finish();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Partial);
        assert_eq!(frames[0].len(), 15);
        assert_eq!(detector.pending(), 0);
    }

    #[test]
    fn test_finish_drops_short_header_prefix() {
        let mut detector = Detector::new();
        detector.feed(&[0x30, 0x36]);

        let frames = detector.finish();
        assert!(frames.is_empty());
        assert_eq!(detector.stats().bytes_dropped, 2);
        assert_eq!(detector.pending(), 0);
    }

    #[test]
    fn test_control_run_needs_context() {
        let mut detector = Detector::new();

        // 0x55 is dropped; the first 0x01 is followed by a control byte and
        // preceded by 0x55, so it is dropped as well. The second 0x01 is the
        // last byte available.
        let frames = detector.feed(&[0x55, 0x01, 0x01]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].offset, 2);
        assert_eq!(detector.stats().bytes_dropped, 2);
    }

    #[test]
    fn test_control_after_frame_boundary() {
        let mut detector = Detector::new();
        let mut bytes = standard();
        bytes.extend_from_slice(&[0x02, 0x00, 0x02]);

        let frames = detector.feed(&bytes);
        let kinds: Vec<FrameKind> = frames.iter().map(|f| f.kind).collect();

        // 0x02 follows the FE terminator, 0x00 follows a non-boundary 0x02 and
        // precedes another control byte, the final 0x02 is last in the buffer.
        assert_eq!(
            kinds,
            [FrameKind::Standard, FrameKind::SingleByte, FrameKind::SingleByte]
        );
        assert_eq!(detector.stats().bytes_dropped, 1);
    }

    #[test]
    fn test_max_pending_below_longest_pattern_rejected() {
        let err = Detector::builder().max_pending(16).build().unwrap_err();
        assert!(matches!(err, SnifferError::Config(_)));
        assert!(err.to_string().contains("longest pattern (28 bytes)"));

        assert!(Detector::builder().max_pending(28).build().is_ok());

        let config = DetectorConfig {
            max_pending: Some(27),
            ..Default::default()
        };
        assert!(Detector::with_config(config).is_err());

        let packets = Detector::builder()
            .catalog(PatternCatalog::canonical_with_packets())
            .max_pending(28)
            .build();
        assert!(packets.is_err());
    }

    #[test]
    fn test_max_pending_keeps_fragmented_frame() {
        let mut detector = Detector::builder().max_pending(28).build().unwrap();
        let bytes = standard();

        let mut frames = Vec::new();
        for byte in &bytes {
            frames.extend(detector.feed(&[*byte]));
            assert!(detector.pending() <= 28);
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Standard);
        assert_eq!(frames[0].payload(), &bytes[..]);
        assert_eq!(detector.stats().bytes_dropped, 0);
    }

    #[test]
    fn test_delimited_packets() {
        let mut stream = vec![0xBE, 0xCC, 0x01, 0xFE];
        stream.extend(standard());
        stream.extend_from_slice(&[0xBE, 0x11, 0xBE, 0x42, 0xFE]);
        stream.extend_from_slice(&[0xBE, 0x33]);

        let catalog = PatternCatalog::canonical_with_packets();
        let mut whole = Detector::builder().catalog(catalog.clone()).build().unwrap();
        let mut bytewise = Detector::builder().catalog(catalog).build().unwrap();

        let mut frames = whole.feed(&stream);
        assert_eq!(whole.pending_bytes(), &[0xBE, 0x33]);
        frames.extend(whole.finish());

        let mut single = Vec::new();
        for byte in &stream {
            single.extend(bytewise.feed(&[*byte]));
        }
        single.extend(bytewise.finish());

        let kinds: Vec<FrameKind> = frames.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            [FrameKind::Delimited, FrameKind::Standard, FrameKind::Delimited]
        );
        assert_eq!(frames[0].payload(), &[0xBE, 0xCC, 0x01, 0xFE]);
        assert_eq!(frames[2].payload(), &[0xBE, 0x42, 0xFE]);
        assert_eq!(frames[2].offset, 4 + 28 + 2);
        match &frames[0].analysis {
            FrameAnalysis::Delimited(packet) => {
                assert_eq!(packet.command, PacketCommand::Power);
                assert_eq!(packet.parameter_len, 1);
            }
            other => panic!("unexpected analysis: {:?}", other),
        }

        // Restarted packet (BE 11) and the unterminated tail (BE 33)
        let stats = whole.stats();
        assert_eq!(stats.bytes_dropped, 4);
        assert_eq!(stats.delimited_frames, 2);
        assert_eq!(stats.frames_found, 1);

        assert_eq!(single, frames);
        assert_eq!(bytewise.stats(), stats);
    }

    #[test]
    fn test_with_config_validates() {
        let config = DetectorConfig {
            read_buffer_size: 0,
            ..Default::default()
        };
        assert!(Detector::with_config(config).is_err());
    }

    #[test]
    fn test_independent_detectors() {
        let mut a = Detector::new();
        let mut b = Detector::new();

        a.feed(&[0x99, 0x99]);
        b.feed(&standard());

        assert_eq!(a.stats().bytes_dropped, 2);
        assert_eq!(b.stats().bytes_dropped, 0);
        assert_eq!(b.stats().frames_found, 1);
    }
}
