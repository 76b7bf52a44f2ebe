//! Frame buffer for accumulating bytes that have not been classified yet.
//!
//! Uses `bytes::BytesMut` as a cursor over a growable array: consuming the
//! front only advances the start of the view and hands the consumed run out
//! as a frozen `Bytes` without copying. Space freed at the front is reclaimed
//! by `BytesMut` on a later append, so there is no per-byte shifting.
//!
//! # Example
//!
//! ```
//! use uart_sniffer::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//! buffer.append(&[0x30, 0x36, 0x26, 0x00]);
//!
//! assert_eq!(buffer.peek(3), &[0x30, 0x36, 0x26]);
//! let head = buffer.consume(3).unwrap();
//! assert_eq!(&head[..], &[0x30, 0x36, 0x26]);
//! assert_eq!(buffer.len(), 1);
//! ```

use bytes::{Bytes, BytesMut};

use crate::error::{Result, SnifferError};

/// Default initial capacity: a few hundred frames worth of serial data.
pub const DEFAULT_CAPACITY: usize = 4 * 1024;

/// Ordered accumulator of pending bytes.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    /// Bytes received but not yet consumed or dropped.
    buffer: BytesMut,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new frame buffer with a custom initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append bytes to the tail. A zero-length slice is a no-op.
    pub fn append(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.buffer.extend_from_slice(data);
        }
    }

    /// Get the number of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Remove and return the first `n` bytes.
    ///
    /// # Errors
    ///
    /// Returns `BufferUnderflow` if `n` exceeds the buffered length. The
    /// buffer is left untouched in that case.
    pub fn consume(&mut self, n: usize) -> Result<Bytes> {
        if n > self.buffer.len() {
            return Err(SnifferError::BufferUnderflow {
                requested: n,
                available: self.buffer.len(),
            });
        }
        Ok(self.buffer.split_to(n).freeze())
    }

    /// Remove and return up to `n` leading bytes.
    pub fn take(&mut self, n: usize) -> Bytes {
        let n = n.min(self.buffer.len());
        self.buffer.split_to(n).freeze()
    }

    /// Inspect up to `n` leading bytes without removing them.
    #[inline]
    pub fn peek(&self, n: usize) -> &[u8] {
        &self.buffer[..n.min(self.buffer.len())]
    }

    /// Byte at position `index` from the front, if buffered.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.buffer.get(index).copied()
    }

    /// All pending bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop every pending byte.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
