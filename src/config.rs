//! Scan configuration.
//!
//! [`ScanConfig`] is built once at startup and passed by reference to every
//! pipeline stage. It carries the detection tuning (threshold, candidate
//! bound, sampling rate, merge window), the interval padding, and the
//! operational hooks (progress callback, cancellation token).
//!
//! # Example
//!
//! ```
//! use sightings::{MergeStrategy, ScanConfig};
//!
//! let config = ScanConfig::new()
//!     .with_padding(3, 1)
//!     .with_max_templates_allowed(2)
//!     .with_merge_strategy(MergeStrategy::Adjacent);
//! assert!(config.validate().is_ok());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::SightingsError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Default similarity a match must reach, on the normalized
/// cross-correlation scale.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.8;

/// Default number of frames per second of video submitted to the matcher.
pub const DEFAULT_SAMPLES_PER_SECOND: u32 = 10;

/// Detections this close together (in seconds of video time) are merged.
pub const DEFAULT_MIN_SEPARATION_SECONDS: f64 = 0.5;

/// How the debouncer picks the event each detection is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Compare every event with the one immediately before it in the raw
    /// detection list, merged or not. A steady stream of detections spaced
    /// under the window collapses into its first event no matter how long it
    /// lasts.
    #[default]
    Adjacent,
    /// Compare every event with the last event that survived. A long
    /// appearance yields one event per window length.
    Anchored,
}

/// Configuration for a template scan.
///
/// Defaults: threshold 0.8, one template instance allowed, no padding,
/// 10 samples per second, 0.5 s merge window, adjacent merging.
#[derive(Clone)]
pub struct ScanConfig {
    pub(crate) match_threshold: f32,
    pub(crate) max_templates_allowed: usize,
    pub(crate) seconds_before: i64,
    pub(crate) seconds_after: i64,
    pub(crate) samples_per_second: u32,
    pub(crate) min_separation_seconds: f64,
    pub(crate) merge_strategy: MergeStrategy,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
}

impl Debug for ScanConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScanConfig")
            .field("match_threshold", &self.match_threshold)
            .field("max_templates_allowed", &self.max_templates_allowed)
            .field("seconds_before", &self.seconds_before)
            .field("seconds_after", &self.seconds_after)
            .field("samples_per_second", &self.samples_per_second)
            .field("min_separation_seconds", &self.min_separation_seconds)
            .field("merge_strategy", &self.merge_strategy)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            max_templates_allowed: 1,
            seconds_before: 0,
            seconds_after: 0,
            samples_per_second: DEFAULT_SAMPLES_PER_SECOND,
            min_separation_seconds: DEFAULT_MIN_SEPARATION_SECONDS,
            merge_strategy: MergeStrategy::default(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the minimum similarity for a matcher candidate.
    #[must_use]
    pub fn with_match_threshold(mut self, threshold: f32) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Set how many simultaneous template instances still count as present.
    ///
    /// Frames with more candidate regions than this are rejected as noise.
    #[must_use]
    pub fn with_max_templates_allowed(mut self, max: usize) -> Self {
        self.max_templates_allowed = max;
        self
    }

    /// Set the padding applied around each detection, in whole seconds.
    #[must_use]
    pub fn with_padding(mut self, seconds_before: i64, seconds_after: i64) -> Self {
        self.seconds_before = seconds_before;
        self.seconds_after = seconds_after;
        self
    }

    /// Set how many frames per second of video are submitted to the matcher.
    #[must_use]
    pub fn with_samples_per_second(mut self, samples: u32) -> Self {
        self.samples_per_second = samples;
        self
    }

    /// Set the merge window, in seconds of video time.
    #[must_use]
    pub fn with_min_separation(mut self, seconds: f64) -> Self {
        self.min_separation_seconds = seconds;
        self
    }

    /// Choose how near-duplicate detections are merged.
    #[must_use]
    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires, in decoded frames.
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn match_threshold(&self) -> f32 {
        self.match_threshold
    }

    pub fn max_templates_allowed(&self) -> usize {
        self.max_templates_allowed
    }

    pub fn seconds_before(&self) -> i64 {
        self.seconds_before
    }

    pub fn seconds_after(&self) -> i64 {
        self.seconds_after
    }

    pub fn samples_per_second(&self) -> u32 {
        self.samples_per_second
    }

    pub fn min_separation_seconds(&self) -> f64 {
        self.min_separation_seconds
    }

    pub fn merge_strategy(&self) -> MergeStrategy {
        self.merge_strategy
    }

    /// Check every value is usable before a scan starts.
    ///
    /// # Errors
    ///
    /// Returns [`SightingsError::InvalidConfiguration`] naming the first bad
    /// value.
    pub fn validate(&self) -> Result<(), SightingsError> {
        if !self.match_threshold.is_finite() || !(-1.0..=1.0).contains(&self.match_threshold) {
            return Err(SightingsError::InvalidConfiguration(format!(
                "match threshold must be within [-1, 1], got {}",
                self.match_threshold
            )));
        }
        if self.max_templates_allowed == 0 {
            return Err(SightingsError::InvalidConfiguration(
                "max templates allowed must be at least 1".to_string(),
            ));
        }
        if self.samples_per_second == 0 {
            return Err(SightingsError::InvalidConfiguration(
                "samples per second must be at least 1".to_string(),
            ));
        }
        if !self.min_separation_seconds.is_finite() || self.min_separation_seconds < 0.0 {
            return Err(SightingsError::InvalidConfiguration(format!(
                "minimum separation must be a non-negative number of seconds, got {}",
                self.min_separation_seconds
            )));
        }
        Ok(())
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
