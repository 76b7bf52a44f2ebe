//! Running detector statistics.

use serde::Serialize;

use crate::protocol::FrameKind;

/// Snapshot of a detector's counters. All fields only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Bytes passed to `feed`.
    pub total_bytes: u64,
    /// Complete frames (standard + error-terminated).
    pub frames_found: u64,
    pub standard_frames: u64,
    pub error_frames: u64,
    pub partial_frames: u64,
    pub single_byte_frames: u64,
    /// Marker-delimited packets.
    pub delimited_frames: u64,
    /// Bytes discarded by resynchronization.
    pub bytes_dropped: u64,
}

impl Stats {
    /// Frames of every kind.
    pub fn frames_total(&self) -> u64 {
        self.frames_found + self.partial_frames + self.single_byte_frames + self.delimited_frames
    }

    pub(crate) fn record_frame(&mut self, kind: FrameKind) {
        match kind {
            FrameKind::Standard => {
                self.frames_found += 1;
                self.standard_frames += 1;
            }
            FrameKind::ErrorTerminated => {
                self.frames_found += 1;
                self.error_frames += 1;
            }
            FrameKind::Partial => self.partial_frames += 1,
            FrameKind::SingleByte => self.single_byte_frames += 1,
            FrameKind::Delimited => self.delimited_frames += 1,
        }
    }

    /// Serialize the snapshot for the logging collaborator.
    pub fn to_json(&self) -> String {
        // A struct of plain integers cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_frame_per_kind() {
        let mut stats = Stats::default();
        stats.record_frame(FrameKind::Standard);
        stats.record_frame(FrameKind::ErrorTerminated);
        stats.record_frame(FrameKind::Partial);
        stats.record_frame(FrameKind::SingleByte);
        stats.record_frame(FrameKind::SingleByte);
        stats.record_frame(FrameKind::Delimited);

        assert_eq!(stats.frames_found, 2);
        assert_eq!(stats.standard_frames, 1);
        assert_eq!(stats.error_frames, 1);
        assert_eq!(stats.partial_frames, 1);
        assert_eq!(stats.single_byte_frames, 2);
        assert_eq!(stats.delimited_frames, 1);
        assert_eq!(stats.frames_total(), 6);
    }

    #[test]
    fn test_to_json() {
        let stats = Stats {
            total_bytes: 29,
            frames_found: 1,
            standard_frames: 1,
            bytes_dropped: 1,
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&stats.to_json()).unwrap();
        assert_eq!(value["total_bytes"], 29);
        assert_eq!(value["bytes_dropped"], 1);
        assert_eq!(value["partial_frames"], 0);
    }
}
