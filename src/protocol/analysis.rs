//! Frame analyzer: read-only annotation of already extracted frames.
//!
//! The meanings below were inferred from captured logs and are speculative.
//! Nothing here fails: values outside the known tables decode to `Unknown`.
//!
//! Layout of a complete frame as the analyzer reads it:
//! ```text
//! [header][body ...][status][terminator: 2 bytes]
//!                      ^ len - 3 (index 25 in a 28-byte frame)
//! ```

use std::fmt;

use serde::Serialize;

use super::catalog::{ERROR_TERMINATOR, STANDARD_TERMINATOR};
use super::frame::FrameKind;

/// Length of the terminator the exact-match table knows about.
const TERMINATOR_LEN: usize = 2;

/// Meaning of the status byte of a complete frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusMeaning {
    Normal,
    Alternate,
    OccasionalVariation,
    RareVariation,
    PossibleError,
    Unknown,
}

impl StatusMeaning {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x30 => StatusMeaning::Normal,
            0x32 => StatusMeaning::Alternate,
            0xF0 => StatusMeaning::OccasionalVariation,
            0xFE => StatusMeaning::RareVariation,
            0xFF => StatusMeaning::PossibleError,
            _ => StatusMeaning::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusMeaning::Normal => "Normal",
            StatusMeaning::Alternate => "Alternate",
            StatusMeaning::OccasionalVariation => "Occasional variation",
            StatusMeaning::RareVariation => "Rare variation",
            StatusMeaning::PossibleError => "Possible error",
            StatusMeaning::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for StatusMeaning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a frame's trailing two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminatorClass {
    /// `CE FE`
    #[serde(rename = "Standard")]
    Standard,
    /// `CE FF`
    #[serde(rename = "Error condition")]
    ErrorCondition,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl TerminatorClass {
    pub fn classify(trailer: &[u8]) -> Self {
        if trailer == STANDARD_TERMINATOR {
            TerminatorClass::Standard
        } else if trailer == ERROR_TERMINATOR {
            TerminatorClass::ErrorCondition
        } else {
            TerminatorClass::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminatorClass::Standard => "Standard",
            TerminatorClass::ErrorCondition => "Error condition",
            TerminatorClass::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TerminatorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Likely purpose of a standalone control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlPurpose {
    #[serde(rename = "Null/empty")]
    Null,
    #[serde(rename = "Control signal")]
    ControlSignal,
    #[serde(rename = "Acknowledgment")]
    Acknowledgment,
    #[serde(rename = "Flow control")]
    FlowControl,
    #[serde(rename = "Status update")]
    StatusUpdate,
    #[serde(rename = "Error indicator")]
    ErrorIndicator,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl ControlPurpose {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => ControlPurpose::Null,
            0x01 => ControlPurpose::ControlSignal,
            0x02 => ControlPurpose::Acknowledgment,
            0xFC => ControlPurpose::FlowControl,
            0xFE => ControlPurpose::StatusUpdate,
            0xFF => ControlPurpose::ErrorIndicator,
            _ => ControlPurpose::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlPurpose::Null => "Null/empty",
            ControlPurpose::ControlSignal => "Control signal",
            ControlPurpose::Acknowledgment => "Acknowledgment",
            ControlPurpose::FlowControl => "Flow control",
            ControlPurpose::StatusUpdate => "Status update",
            ControlPurpose::ErrorIndicator => "Error indicator",
            ControlPurpose::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ControlPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command family of a marker-delimited packet, named by its first body byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacketCommand {
    Power,
    Control,
    Status,
    Header,
    Unknown,
}

impl PacketCommand {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0xCC => PacketCommand::Power,
            0xC2 => PacketCommand::Control,
            0x42 => PacketCommand::Status,
            0xCE => PacketCommand::Header,
            _ => PacketCommand::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PacketCommand::Power => "Power command",
            PacketCommand::Control => "Control command",
            PacketCommand::Status => "Status",
            PacketCommand::Header => "Header",
            PacketCommand::Unknown => "Unknown command",
        }
    }
}

impl fmt::Display for PacketCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded fields of a standard or error-terminated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FixedAnalysis {
    /// Raw status byte (absent only for frames shorter than a terminator plus one).
    pub status_byte: Option<u8>,
    pub status: StatusMeaning,
    /// Whether the frame starts with its pattern's header.
    pub header_valid: bool,
    pub terminator: TerminatorClass,
    /// XOR of the bytes between header and status byte.
    pub body_xor: u8,
}

/// Fields of a truncated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartialAnalysis {
    pub header_valid: bool,
    pub length: usize,
}

/// Fields of a single-byte control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlAnalysis {
    pub value: u8,
    pub likely_purpose: ControlPurpose,
}

/// Fields of a marker-delimited packet. Markers are not part of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelimitedAnalysis {
    /// First body byte, absent for an empty packet.
    pub command_byte: Option<u8>,
    pub command: PacketCommand,
    /// Body length, markers excluded.
    pub body_len: usize,
    /// Body bytes after the command byte.
    pub parameter_len: usize,
}

/// Kind-specific analysis record attached to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FrameAnalysis {
    Fixed(FixedAnalysis),
    Partial(PartialAnalysis),
    SingleByte(ControlAnalysis),
    Delimited(DelimitedAnalysis),
}

impl fmt::Display for FrameAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameAnalysis::Fixed(fixed) => {
                match fixed.status_byte {
                    Some(byte) => write!(f, "status {} (0x{:02X})", fixed.status, byte)?,
                    None => write!(f, "status {}", fixed.status)?,
                }
                write!(
                    f,
                    ", terminator {}, body xor 0x{:02X}",
                    fixed.terminator, fixed.body_xor
                )
            }
            FrameAnalysis::Partial(partial) => write!(
                f,
                "{} bytes, header {}",
                partial.length,
                if partial.header_valid { "ok" } else { "missing" }
            ),
            FrameAnalysis::SingleByte(control) => write!(f, "{}", control.likely_purpose),
            FrameAnalysis::Delimited(packet) => match packet.command_byte {
                Some(byte) => write!(
                    f,
                    "{} (0x{:02X}), {} parameter byte(s)",
                    packet.command, byte, packet.parameter_len
                ),
                None => f.write_str("empty packet"),
            },
        }
    }
}

/// XOR of every byte in `bytes`.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Annotate a frame of `kind` whose pattern expects `header`.
pub fn analyze(kind: FrameKind, payload: &[u8], header: &[u8]) -> FrameAnalysis {
    match kind {
        FrameKind::Standard | FrameKind::ErrorTerminated => {
            FrameAnalysis::Fixed(analyze_fixed(payload, header))
        }
        FrameKind::Partial => FrameAnalysis::Partial(PartialAnalysis {
            header_valid: payload.starts_with(header),
            length: payload.len(),
        }),
        FrameKind::SingleByte => {
            let value = payload.first().copied().unwrap_or(0);
            FrameAnalysis::SingleByte(ControlAnalysis {
                value,
                likely_purpose: ControlPurpose::from_byte(value),
            })
        }
        FrameKind::Delimited => FrameAnalysis::Delimited(analyze_delimited(payload)),
    }
}

fn analyze_delimited(payload: &[u8]) -> DelimitedAnalysis {
    let body = payload
        .get(1..payload.len().saturating_sub(1))
        .unwrap_or(&[]);
    let command_byte = body.first().copied();

    DelimitedAnalysis {
        command_byte,
        command: command_byte
            .map(PacketCommand::from_byte)
            .unwrap_or(PacketCommand::Unknown),
        body_len: body.len(),
        parameter_len: body.len().saturating_sub(1),
    }
}

fn analyze_fixed(payload: &[u8], header: &[u8]) -> FixedAnalysis {
    let trailer_start = payload.len().saturating_sub(TERMINATOR_LEN);
    let status_offset = payload.len().checked_sub(TERMINATOR_LEN + 1);
    let status_byte = status_offset.and_then(|i| payload.get(i).copied());

    let body = match status_offset {
        Some(end) if end > header.len() => &payload[header.len()..end],
        _ => &[][..],
    };

    FixedAnalysis {
        status_byte,
        status: status_byte
            .map(StatusMeaning::from_byte)
            .unwrap_or(StatusMeaning::Unknown),
        header_valid: payload.starts_with(header),
        terminator: TerminatorClass::classify(&payload[trailer_start..]),
        body_xor: xor_checksum(body),
    }
}
