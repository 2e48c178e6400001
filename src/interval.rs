//! Frame-index to padded time-range conversion.
//!
//! Timestamps are whole seconds. A detection at frame `f` sits at
//! `f / fps` seconds (integer division, so sub-second detections round down),
//! and the reported interval is that instant padded by `seconds_before` and
//! `seconds_after`.
//!
//! Padding can push the start before the beginning of the video; such starts
//! are clamped to `00:00:00`. Times past a day wrap their hour field modulo
//! 24, matching a wall-clock `HH:MM:SS` display.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Serialize, Serializer, ser::SerializeTuple};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const HOURS_PER_DAY: i64 = 24;

/// A non-negative offset into the video, in whole seconds.
///
/// Displays and serializes as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
}

impl Timestamp {
    /// Build a timestamp, clamping negative values to zero.
    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            seconds: seconds.max(0),
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.seconds
    }

    pub fn hours(&self) -> i64 {
        (self.seconds / SECONDS_PER_HOUR) % HOURS_PER_DAY
    }

    pub fn minutes(&self) -> i64 {
        (self.seconds / SECONDS_PER_MINUTE) % 60
    }

    pub fn seconds(&self) -> i64 {
        self.seconds % SECONDS_PER_MINUTE
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:02}:{:02}:{:02}", self.hours(), self.minutes(), self.seconds())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The padded window around one detection.
///
/// Serializes as a two-element array `["HH:MM:SS", "HH:MM:SS"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub appear: Timestamp,
    pub disappear: Timestamp,
}

impl TimeInterval {
    /// Build the interval for a detection at `frame_index`.
    ///
    /// Negative padding is accepted; the result is normalised so that
    /// `appear <= disappear`.
    ///
    /// ```
    /// use sightings::TimeInterval;
    ///
    /// let interval = TimeInterval::around_frame(300, 30, 3, 1);
    /// assert_eq!(interval.appear.to_string(), "00:00:07");
    /// assert_eq!(interval.disappear.to_string(), "00:00:11");
    /// ```
    pub fn around_frame(
        frame_index: u64,
        frames_per_second: u32,
        seconds_before: i64,
        seconds_after: i64,
    ) -> Self {
        let total_seconds = if frames_per_second == 0 {
            0
        } else {
            i64::try_from(frame_index / u64::from(frames_per_second)).unwrap_or(i64::MAX)
        };

        let appear = Timestamp::from_seconds(total_seconds.saturating_sub(seconds_before));
        let disappear = Timestamp::from_seconds(total_seconds.saturating_add(seconds_after));

        Self {
            appear: appear.min(disappear),
            disappear: appear.max(disappear),
        }
    }
}

impl Serialize for TimeInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.appear)?;
        pair.serialize_element(&self.disappear)?;
        pair.end()
    }
}

/// Build one interval per event, in event order.
pub fn build_intervals(
    events: &[u64],
    frames_per_second: u32,
    seconds_before: i64,
    seconds_after: i64,
) -> Vec<TimeInterval> {
    events
        .iter()
        .map(|&frame| TimeInterval::around_frame(frame, frames_per_second, seconds_before, seconds_after))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_components() {
        let ts = Timestamp::from_seconds(3 * 3600 + 25 * 60 + 9);
        assert_eq!(ts.to_string(), "03:25:09");
    }

    #[test]
    fn hours_wrap_after_a_day() {
        assert_eq!(Timestamp::from_seconds(25 * 3600 + 1).to_string(), "01:00:01");
    }

    #[test]
    fn sub_second_frames_round_down() {
        let interval = TimeInterval::around_frame(29, 30, 0, 0);
        assert_eq!(interval.appear.total_seconds(), 0);
        let interval = TimeInterval::around_frame(30, 30, 0, 0);
        assert_eq!(interval.appear.total_seconds(), 1);
    }

    #[test]
    fn negative_padding_keeps_order() {
        let interval = TimeInterval::around_frame(300, 30, -5, -5);
        assert!(interval.appear <= interval.disappear);
        assert_eq!(interval.appear.to_string(), "00:00:05");
        assert_eq!(interval.disappear.to_string(), "00:00:15");
    }
}
