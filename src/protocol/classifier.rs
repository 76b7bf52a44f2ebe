//! Single-byte control code classifier.
//!
//! Consulted only when no multi-byte pattern can match. A byte from the
//! control set stands alone only when local context supports it:
//!
//! - it is the first byte of the stream,
//! - it is the last byte currently buffered,
//! - the next byte is not itself a control candidate,
//! - the byte before it was a boundary marker.
//!
//! A control byte wedged between other control candidates with none of the
//! above is left to resynchronization.

use super::catalog::{ERROR_TERMINATOR, STANDARD_TERMINATOR};

/// Default boundary markers: the last byte of each terminator.
pub const DEFAULT_BOUNDARY_MARKERS: [u8; 2] =
    [STANDARD_TERMINATOR[1], ERROR_TERMINATOR[1]];

/// Context around the byte being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteContext {
    /// No byte has been consumed or dropped before this one.
    pub first_in_stream: bool,
    /// The byte most recently consumed or dropped.
    pub previous: Option<u8>,
    /// The byte following this one, if already buffered.
    pub next: Option<u8>,
}

/// Lookup tables for control candidates and boundary markers.
#[derive(Debug, Clone)]
pub struct ControlClassifier {
    control: [bool; 256],
    boundary: [bool; 256],
}

impl ControlClassifier {
    pub fn new(control_bytes: &[u8], boundary_markers: &[u8]) -> Self {
        let mut control = [false; 256];
        for &b in control_bytes {
            control[b as usize] = true;
        }
        let mut boundary = [false; 256];
        for &b in boundary_markers {
            boundary[b as usize] = true;
        }
        Self { control, boundary }
    }

    /// Whether `byte` is in the control set at all.
    #[inline]
    pub fn is_control(&self, byte: u8) -> bool {
        self.control[byte as usize]
    }

    #[inline]
    pub fn is_boundary(&self, byte: u8) -> bool {
        self.boundary[byte as usize]
    }

    /// Decide whether `byte` is a standalone control code in `ctx`.
    pub fn classify(&self, byte: u8, ctx: ByteContext) -> bool {
        if !self.is_control(byte) {
            return false;
        }
        if ctx.first_in_stream {
            return true;
        }
        match ctx.next {
            None => return true,
            Some(next) if !self.is_control(next) => return true,
            Some(_) => {}
        }
        ctx.previous.is_some_and(|prev| self.is_boundary(prev))
    }
}
