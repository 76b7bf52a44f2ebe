//! Pattern catalog: the ordered set of frame shapes the detector recognises.
//!
//! The observed link mixes three framing styles:
//! ```text
//! standard          ┌──────────┬─────────────────────────┬────────┬──────────┐
//! error-terminated  │ 30 36 26 │ body (22 bytes)         │ status │ CE FE/FF │
//!                   │ 3 bytes  │                         │ 1 byte │ 2 bytes  │
//!                   └──────────┴─────────────────────────┴────────┴──────────┘
//! partial           30 36 26 ... (10..=27 bytes, no terminator check)
//! single-byte       00 | 01 | 02 | FC | FE | FF
//! ```
//!
//! A second link (the LCD side) carries variable-length packets framed by
//! start and end markers:
//! ```text
//! delimited         BE │ command │ parameters ... │ FE
//! ```
//! The canonical catalog holds only the first family;
//! [`PatternCatalog::canonical_with_packets`] adds the delimited one.
//!
//! Patterns are consulted strictly in catalog order. Fixed-size variants come
//! before the partial variant sharing their header so a complete match always
//! wins.

use std::borrow::Cow;
use std::collections::HashSet;

use bytes::Bytes;

use super::frame::FrameKind;
use crate::error::{Result, SnifferError};

/// Leading bytes shared by every multi-byte frame on the link.
pub const FRAME_HEADER: [u8; 3] = [0x30, 0x36, 0x26];

/// Total length of a complete (standard or error-terminated) frame.
pub const STANDARD_FRAME_SIZE: usize = 28;

/// Terminator of a standard frame.
pub const STANDARD_TERMINATOR: [u8; 2] = [0xCE, 0xFE];

/// Terminator of an error-terminated frame.
pub const ERROR_TERMINATOR: [u8; 2] = [0xCE, 0xFF];

/// Smallest truncated frame worth reporting.
pub const PARTIAL_MIN_SIZE: usize = 10;

/// Largest truncated frame (one byte short of a complete frame).
pub const PARTIAL_MAX_SIZE: usize = 27;

/// Offset of the status byte inside a complete frame.
pub const STATUS_BYTE_OFFSET: usize = 25;

/// Byte values that may stand alone as control codes.
pub const CONTROL_BYTES: [u8; 6] = [0x00, 0x01, 0x02, 0xFC, 0xFE, 0xFF];

/// Start marker of a delimited packet.
pub const PACKET_START_MARKER: u8 = 0xBE;

/// End marker of a delimited packet.
pub const PACKET_END_MARKER: u8 = 0xFE;

/// Longest delimited packet searched for, markers included.
pub const PACKET_MAX_LEN: usize = 64;

/// Result of testing one pattern against the front of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMatch {
    /// The pattern matches and would consume this many bytes.
    Matched(usize),
    /// Everything seen so far fits the pattern but it needs more bytes to decide.
    Incomplete,
    /// The pattern does not apply.
    Rejected,
}

/// Outcome of one extraction attempt against the whole catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// `pattern` (catalog index) matched; consume `len` bytes as a `kind` frame.
    Matched {
        pattern: usize,
        kind: FrameKind,
        len: usize,
    },
    /// A pattern is still waiting for bytes; nothing may be consumed yet.
    Incomplete,
    /// No multi-byte pattern can match the front of the buffer.
    NoMatch,
}

/// How an incomplete fixed-size match interacts with partial patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialPolicy {
    /// Wait for a fixed pattern's full size before falling back to a partial one.
    #[default]
    Deferred,
    /// Let a partial pattern fire as soon as its minimum size is buffered, even
    /// while a fixed pattern with the same header is still incomplete.
    Eager,
}

/// Immutable frame pattern descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Exact-size frame confirmed by a trailing terminator.
    Fixed {
        name: Cow<'static, str>,
        kind: FrameKind,
        header: Bytes,
        size: usize,
        terminator: Bytes,
    },
    /// Truncated variant: header only, length bounded by `min_size..=max_size`.
    Partial {
        name: Cow<'static, str>,
        header: Bytes,
        min_size: usize,
        max_size: usize,
    },
    /// Variable-length packet from `start` up to the first `end`, both
    /// markers included, at most `max_len` bytes. A second `start` before
    /// the `end` rejects the packet.
    Delimited {
        name: Cow<'static, str>,
        start: u8,
        end: u8,
        max_len: usize,
    },
}

impl Pattern {
    /// Create a fixed-size pattern.
    pub fn fixed(
        name: impl Into<Cow<'static, str>>,
        kind: FrameKind,
        header: impl Into<Bytes>,
        size: usize,
        terminator: impl Into<Bytes>,
    ) -> Self {
        Pattern::Fixed {
            name: name.into(),
            kind,
            header: header.into(),
            size,
            terminator: terminator.into(),
        }
    }

    /// Create a partial (truncated) pattern.
    pub fn partial(
        name: impl Into<Cow<'static, str>>,
        header: impl Into<Bytes>,
        min_size: usize,
        max_size: usize,
    ) -> Self {
        Pattern::Partial {
            name: name.into(),
            header: header.into(),
            min_size,
            max_size,
        }
    }

    /// Create a marker-delimited pattern.
    pub fn delimited(
        name: impl Into<Cow<'static, str>>,
        start: u8,
        end: u8,
        max_len: usize,
    ) -> Self {
        Pattern::Delimited {
            name: name.into(),
            start,
            end,
            max_len,
        }
    }

    /// Unique tag of this pattern.
    pub fn name(&self) -> &str {
        match self {
            Pattern::Fixed { name, .. }
            | Pattern::Partial { name, .. }
            | Pattern::Delimited { name, .. } => name,
        }
    }

    /// Expected leading bytes.
    pub fn header(&self) -> &[u8] {
        match self {
            Pattern::Fixed { header, .. } | Pattern::Partial { header, .. } => header,
            Pattern::Delimited { start, .. } => std::slice::from_ref(start),
        }
    }

    /// Kind of frame this pattern produces.
    pub fn kind(&self) -> FrameKind {
        match self {
            Pattern::Fixed { kind, .. } => *kind,
            Pattern::Partial { .. } => FrameKind::Partial,
            Pattern::Delimited { .. } => FrameKind::Delimited,
        }
    }

    /// Longest run of bytes this pattern can consume.
    pub fn max_len(&self) -> usize {
        match self {
            Pattern::Fixed { size, .. } => *size,
            Pattern::Partial { max_size, .. } => *max_size,
            Pattern::Delimited { max_len, .. } => *max_len,
        }
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Pattern::Fixed { .. })
    }

    /// Test this pattern against the front of `buf`.
    ///
    /// With `at_end` set no more bytes will ever arrive, so every case that
    /// would otherwise wait is reported as `Rejected`.
    pub fn evaluate(&self, buf: &[u8], at_end: bool) -> PatternMatch {
        let header = self.header();
        let seen = buf.len().min(header.len());
        if buf[..seen] != header[..seen] {
            return PatternMatch::Rejected;
        }

        let waiting = if at_end {
            PatternMatch::Rejected
        } else {
            PatternMatch::Incomplete
        };

        if buf.len() < header.len() {
            return waiting;
        }

        match self {
            Pattern::Fixed {
                size, terminator, ..
            } => {
                if buf.len() < *size {
                    return waiting;
                }
                if buf[*size - terminator.len()..*size] == terminator[..] {
                    PatternMatch::Matched(*size)
                } else {
                    PatternMatch::Rejected
                }
            }
            Pattern::Partial {
                min_size, max_size, ..
            } => {
                if buf.len() >= *min_size {
                    PatternMatch::Matched(buf.len().min(*max_size))
                } else {
                    waiting
                }
            }
            Pattern::Delimited {
                start,
                end,
                max_len,
                ..
            } => {
                let window = &buf[1..buf.len().min(*max_len)];
                for (i, &byte) in window.iter().enumerate() {
                    if byte == *end {
                        return PatternMatch::Matched(i + 2);
                    }
                    if byte == *start {
                        return PatternMatch::Rejected;
                    }
                }
                if buf.len() >= *max_len {
                    PatternMatch::Rejected
                } else {
                    waiting
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.header().is_empty() {
            return Err(SnifferError::InvalidPattern(format!(
                "pattern '{}' has an empty header",
                self.name()
            )));
        }
        match self {
            Pattern::Fixed {
                name,
                kind,
                header,
                size,
                terminator,
            } => {
                if !matches!(kind, FrameKind::Standard | FrameKind::ErrorTerminated) {
                    return Err(SnifferError::InvalidPattern(format!(
                        "fixed pattern '{}' cannot produce {} frames",
                        name, kind
                    )));
                }
                if *size < header.len() + terminator.len() {
                    return Err(SnifferError::InvalidPattern(format!(
                        "fixed pattern '{}' size {} is smaller than header + terminator ({})",
                        name,
                        size,
                        header.len() + terminator.len()
                    )));
                }
            }
            Pattern::Partial {
                name,
                header,
                min_size,
                max_size,
            } => {
                if *min_size < header.len() {
                    return Err(SnifferError::InvalidPattern(format!(
                        "partial pattern '{}' min_size {} is shorter than its header",
                        name, min_size
                    )));
                }
                if min_size > max_size {
                    return Err(SnifferError::InvalidPattern(format!(
                        "partial pattern '{}' min_size {} exceeds max_size {}",
                        name, min_size, max_size
                    )));
                }
            }
            Pattern::Delimited {
                name,
                start,
                end,
                max_len,
            } => {
                if start == end {
                    return Err(SnifferError::InvalidPattern(format!(
                        "delimited pattern '{}' uses 0x{:02X} as both markers",
                        name, start
                    )));
                }
                if *max_len < 2 {
                    return Err(SnifferError::InvalidPattern(format!(
                        "delimited pattern '{}' max_len {} cannot hold both markers",
                        name, max_len
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Ordered pattern list plus the set of standalone control bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCatalog {
    patterns: Vec<Pattern>,
    control_bytes: Vec<u8>,
}

impl PatternCatalog {
    /// Build a catalog, validating every pattern.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` for an inconsistent descriptor or a repeated name.
    pub fn new(patterns: Vec<Pattern>, control_bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let mut names = HashSet::new();
        for pattern in &patterns {
            pattern.validate()?;
            if !names.insert(pattern.name()) {
                return Err(SnifferError::InvalidPattern(format!(
                    "duplicate pattern name '{}'",
                    pattern.name()
                )));
            }
        }
        Ok(Self {
            patterns,
            control_bytes: control_bytes.into(),
        })
    }

    /// The catalog observed on the captured link.
    pub fn canonical() -> Self {
        Self {
            patterns: vec![
                Pattern::fixed(
                    "standard",
                    FrameKind::Standard,
                    Bytes::from_static(&FRAME_HEADER),
                    STANDARD_FRAME_SIZE,
                    Bytes::from_static(&STANDARD_TERMINATOR),
                ),
                Pattern::fixed(
                    "error-terminated",
                    FrameKind::ErrorTerminated,
                    Bytes::from_static(&FRAME_HEADER),
                    STANDARD_FRAME_SIZE,
                    Bytes::from_static(&ERROR_TERMINATOR),
                ),
                Pattern::partial(
                    "partial",
                    Bytes::from_static(&FRAME_HEADER),
                    PARTIAL_MIN_SIZE,
                    PARTIAL_MAX_SIZE,
                ),
            ],
            control_bytes: CONTROL_BYTES.to_vec(),
        }
    }

    /// The canonical catalog followed by the delimited packet family.
    pub fn canonical_with_packets() -> Self {
        let mut catalog = Self::canonical();
        catalog.patterns.push(Pattern::delimited(
            "packet",
            PACKET_START_MARKER,
            PACKET_END_MARKER,
            PACKET_MAX_LEN,
        ));
        catalog
    }

    /// Patterns in priority order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Pattern at a catalog index.
    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    /// Longest run any pattern can consume; the buffer never needs more.
    pub fn max_frame_len(&self) -> usize {
        self.patterns.iter().map(Pattern::max_len).max().unwrap_or(0)
    }

    /// Bytes eligible as standalone control codes.
    pub fn control_bytes(&self) -> &[u8] {
        &self.control_bytes
    }

    /// Run one extraction attempt over the catalog.
    ///
    /// The first matching pattern in catalog order wins.
    pub fn try_match(&self, buf: &[u8], policy: PartialPolicy, at_end: bool) -> MatchOutcome {
        let mut waiting = false;

        for (index, pattern) in self.patterns.iter().enumerate() {
            match pattern.evaluate(buf, at_end) {
                PatternMatch::Matched(len) => {
                    return MatchOutcome::Matched {
                        pattern: index,
                        kind: pattern.kind(),
                        len,
                    };
                }
                PatternMatch::Incomplete => {
                    if policy == PartialPolicy::Deferred || !pattern.is_fixed() {
                        return MatchOutcome::Incomplete;
                    }
                    waiting = true;
                }
                PatternMatch::Rejected => {}
            }
        }

        if waiting {
            MatchOutcome::Incomplete
        } else {
            MatchOutcome::NoMatch
        }
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::canonical()
    }
}
