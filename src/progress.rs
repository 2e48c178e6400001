//! Progress reporting and cancellation support.
//!
//! A scan decodes every frame of the video, which takes a while on long
//! recordings. [`ProgressCallback`] lets callers observe how far the scan has
//! got and [`CancellationToken`] lets them stop it between frames.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sightings::{
//!     CorrelationMatcher, ProgressCallback, ProgressInfo, ScanConfig, Scanner,
//!     SightingsError, Template, VideoSource,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% ({} detections so far)", info.detections);
//!         }
//!     }
//! }
//!
//! let template = Template::open("button.png")?;
//! let mut source = VideoSource::open("input.mp4")?;
//! let config = ScanConfig::new().with_progress(Arc::new(PrintProgress));
//! let matcher = CorrelationMatcher::new(config.match_threshold());
//! let report = Scanner::new(&config, &matcher, &template).run(&mut source)?;
//! # Ok::<(), SightingsError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of scan progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled by
/// [`ScanConfig::with_batch_size`](crate::ScanConfig::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many frames have been decoded so far.
    pub current: u64,
    /// Total frames reported by the source, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    ///
    /// The container's frame count is an estimate, so this may overshoot
    /// 100 slightly on the last few frames.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the scan started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Index of the most recently decoded frame.
    pub current_frame: Option<u64>,
    /// Raw (not yet merged) detections recorded so far.
    pub detections: usize,
}

/// Trait for receiving progress updates during a scan.
///
/// Callbacks observe but cannot halt the scan. Use [`CancellationToken`] for
/// cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals while frames are decoded.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. Default when nothing is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state. The scan loop checks
/// [`is_cancelled`](CancellationToken::is_cancelled) before decoding each
/// frame and returns [`SightingsError::Cancelled`](crate::SightingsError::Cancelled).
///
/// ```
/// use sightings::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.clone().cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing and emits callbacks every `batch_size` frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
    last_frame: Option<u64>,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: Option<u64>, batch_size: u64) -> Self {
        Self {
            callback,
            total: total.filter(|&t| t > 0),
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
            last_frame: None,
        }
    }

    /// Record one decoded frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, frame_index: u64, detections: usize) {
        self.current += 1;
        self.items_since_last_report += 1;
        self.last_frame = Some(frame_index);

        if self.items_since_last_report >= self.batch_size {
            self.report(detections);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self, detections: usize) {
        self.report(detections);
    }

    fn report(&self, detections: usize) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: self.last_frame,
            detections,
        };

        self.callback.on_progress(&info);
    }
}
