//! Error types for uart-sniffer.
//!
//! Protocol ambiguity is never an error here: unmatched bytes are dropped and
//! counted, undecodable values map to `Unknown`. These variants cover API
//! misuse, bad configuration and the I/O of the optional async reader.

use thiserror::Error;

/// Main error type for all uart-sniffer operations.
#[derive(Debug, Error)]
pub enum SnifferError {
    /// More bytes were requested from the frame buffer than it holds.
    #[error("Buffer underflow: requested {requested} bytes, {available} available")]
    BufferUnderflow { requested: usize, available: usize },

    /// A pattern descriptor is internally inconsistent.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading chunks from a byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using SnifferError.
pub type Result<T> = std::result::Result<T, SnifferError>;
