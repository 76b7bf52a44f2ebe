//! Detector configuration.
//!
//! Every knob has a default matching the behavior observed on the captured
//! link, so `DetectorConfig::default()` is what most callers want. A config
//! can also be loaded from JSON:
//!
//! ```
//! use uart_sniffer::{DetectorConfig, PartialPolicy};
//!
//! let config = DetectorConfig::from_json(r#"{ "partial_policy": "eager", "max_pending": 512 }"#).unwrap();
//! assert_eq!(config.partial_policy, PartialPolicy::Eager);
//! assert_eq!(config.max_pending, Some(512));
//! assert_eq!(config.read_buffer_size, 4096);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnifferError};
use crate::protocol::{PartialPolicy, DEFAULT_BOUNDARY_MARKERS};

/// Default chunk size for the async reader.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Tunables for a [`Detector`](crate::Detector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Whether partial frames may be cut before a fixed frame could complete.
    pub partial_policy: PartialPolicy,
    /// Preceding byte values that let a control byte stand alone.
    pub boundary_markers: Vec<u8>,
    /// Cap on unclassified bytes; the oldest excess bytes are dropped.
    pub max_pending: Option<usize>,
    /// Chunk size used by [`FrameReader`](crate::reader::FrameReader).
    pub read_buffer_size: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            partial_policy: PartialPolicy::default(),
            boundary_markers: DEFAULT_BOUNDARY_MARKERS.to_vec(),
            max_pending: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl DetectorConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(SnifferError::Config(
                "read_buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.max_pending == Some(0) {
            return Err(SnifferError::Config(
                "max_pending must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}
