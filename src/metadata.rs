//! Video stream metadata.
//!
//! Read once when a [`VideoSource`](crate::VideoSource) is opened and cached
//! for its lifetime.

use std::time::Duration;

/// Metadata for the video stream being scanned.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second as reported by the stream (may be fractional,
    /// e.g. 29.97).
    pub frames_per_second: f64,
    /// Total number of frames. Taken from the stream header when present,
    /// otherwise estimated from duration and frame rate.
    pub frame_count: u64,
    /// Duration of the container.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
}

impl VideoMetadata {
    /// The frame rate the pipeline works with: the reported rate truncated
    /// to whole frames per second.
    pub fn whole_frames_per_second(&self) -> u32 {
        if self.frames_per_second.is_finite() && self.frames_per_second >= 1.0 {
            self.frames_per_second.trunc().min(u32::MAX as f64) as u32
        } else {
            0
        }
    }
}

/// Frame count for progress reporting.
///
/// Uses the stream header's count when it has one. Otherwise multiplies the
/// container duration by the reported, possibly fractional, rate: the result
/// approximates how many frames the decoder yields. Stride and timestamp
/// arithmetic use [`VideoMetadata::whole_frames_per_second`] instead. The
/// count only feeds progress totals and never affects detections or intervals.
pub(crate) fn estimate_frame_count(header_frames: i64, duration: Duration, frames_per_second: f64) -> u64 {
    if header_frames > 0 {
        return header_frames as u64;
    }
    if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
        return 0;
    }
    (duration.as_secs_f64() * frames_per_second) as u64
}
