//! Protocol module - pattern catalog, framing, and frame types.
//!
//! This module holds the building blocks of the detector:
//! - Ordered pattern catalog and the observed constants
//! - Frame buffer for accumulating partial reads
//! - Single-byte control classifier
//! - Frame struct and its read-only analyzer

mod analysis;
mod catalog;
mod classifier;
mod frame;
mod frame_buffer;

pub use analysis::{
    analyze, xor_checksum, ControlAnalysis, ControlPurpose, DelimitedAnalysis, FixedAnalysis,
    FrameAnalysis, PacketCommand, PartialAnalysis, StatusMeaning, TerminatorClass,
};
pub use catalog::{
    MatchOutcome, PartialPolicy, Pattern, PatternCatalog, PatternMatch, CONTROL_BYTES,
    ERROR_TERMINATOR, FRAME_HEADER, PACKET_END_MARKER, PACKET_MAX_LEN, PACKET_START_MARKER,
    PARTIAL_MAX_SIZE, PARTIAL_MIN_SIZE, STANDARD_FRAME_SIZE, STANDARD_TERMINATOR,
    STATUS_BYTE_OFFSET,
};
pub use classifier::{ByteContext, ControlClassifier, DEFAULT_BOUNDARY_MARKERS};
pub use frame::{Frame, FrameKind};
pub use frame_buffer::{FrameBuffer, DEFAULT_CAPACITY};
