//! The scan driver.
//!
//! [`Scanner`] wires the stages together: it pulls frames from a
//! [`FrameSource`], passes them through the [`Sampler`], classifies the
//! survivors with the [`Detector`], then merges detections and pads them
//! into [`TimeInterval`]s once the source reports end of stream.
//!
//! Everything runs on the calling thread, one frame at a time. At most two
//! decoded frames are alive at once: the one being offered and the
//! sampler's retained frame.
//!
//! # Example
//!
//! ```no_run
//! use sightings::{CorrelationMatcher, ScanConfig, Scanner, SightingsError, Template, VideoSource};
//!
//! let template = Template::open("concede.png")?;
//! let mut source = VideoSource::open("match.mp4")?;
//! let config = ScanConfig::new().with_padding(3, 3);
//! let matcher = CorrelationMatcher::new(config.match_threshold());
//!
//! let report = Scanner::new(&config, &matcher, &template).run(&mut source)?;
//! for interval in &report.intervals {
//!     println!("{} - {}", interval.appear, interval.disappear);
//! }
//! # Ok::<(), SightingsError>(())
//! ```

use crate::{
    config::ScanConfig,
    debounce::merge_detections,
    detector::{Detector, FrameObserver},
    error::SightingsError,
    interval::{TimeInterval, build_intervals},
    matcher::Matcher,
    progress::ProgressTracker,
    sampler::{SampleDecision, Sampler},
    source::FrameSource,
    template::Template,
};

/// The outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Whole frames per second used for every time computation.
    pub frames_per_second: u32,
    /// Frame indices where the template was accepted, before merging.
    pub detections: Vec<u64>,
    /// Detections that survived merging, one per distinct appearance.
    pub events: Vec<u64>,
    /// Padded time range for each event, in event order.
    pub intervals: Vec<TimeInterval>,
    /// Frames decoded from the source.
    pub frames_decoded: u64,
    /// Frames handed to the matcher.
    pub frames_matched: u64,
    /// On-stride frames skipped because they repeated the retained frame.
    pub duplicates_skipped: u64,
}

/// Runs one template over one frame source.
pub struct Scanner<'a> {
    config: &'a ScanConfig,
    matcher: &'a dyn Matcher,
    template: &'a Template,
    observer: Option<&'a mut dyn FrameObserver>,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a ScanConfig, matcher: &'a dyn Matcher, template: &'a Template) -> Self {
        Self {
            config,
            matcher,
            template,
            observer: None,
        }
    }

    /// Attach a debug observer, notified after every matcher call.
    #[must_use]
    pub fn with_observer(mut self, observer: &'a mut dyn FrameObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Scan `source` to the end and build the report.
    ///
    /// # Errors
    ///
    /// - [`SightingsError::InvalidConfiguration`] if the config does not
    ///   validate.
    /// - [`SightingsError::InvalidFrameRate`] if the source reports 0 fps.
    /// - [`SightingsError::Cancelled`] if the cancellation token fires.
    /// - Any error the source returns while decoding. No partial report is
    ///   produced.
    pub fn run<S: FrameSource + ?Sized>(self, source: &mut S) -> Result<ScanReport, SightingsError> {
        let config = self.config;
        config.validate()?;

        let frames_per_second = source.frames_per_second();
        if frames_per_second == 0 {
            return Err(SightingsError::InvalidFrameRate(0.0));
        }

        let mut sampler = Sampler::new(frames_per_second, config.samples_per_second);
        let mut detector = Detector::new(self.matcher, self.template, config.max_templates_allowed);
        if let Some(observer) = self.observer {
            detector = detector.with_observer(observer);
        }

        let mut tracker = ProgressTracker::new(
            config.progress.clone(),
            Some(source.frame_count()),
            config.batch_size,
        );

        log::info!(
            "Scanning at {} fps (stride {}, ~{} frames)",
            frames_per_second,
            sampler.stride(),
            source.frame_count()
        );

        let mut report = ScanReport {
            frames_per_second,
            ..ScanReport::default()
        };

        loop {
            if config.is_cancelled() {
                log::info!("Scan cancelled after {} frames", report.frames_decoded);
                return Err(SightingsError::Cancelled);
            }

            let Some(frame) = source.next_frame()? else {
                break;
            };
            let index = frame.index();
            report.frames_decoded += 1;

            match sampler.offer(frame) {
                SampleDecision::OffStride => {}
                SampleDecision::Duplicate => report.duplicates_skipped += 1,
                SampleDecision::Submit => {
                    report.frames_matched += 1;
                    if let Some(retained) = sampler.retained()
                        && detector.detect(retained)
                    {
                        report.detections.push(index);
                    }
                }
            }

            tracker.advance(index, report.detections.len());
        }
        tracker.finish(report.detections.len());

        report.events = merge_detections(
            &report.detections,
            frames_per_second,
            config.min_separation_seconds,
            config.merge_strategy,
        );
        report.intervals = build_intervals(
            &report.events,
            frames_per_second,
            config.seconds_before,
            config.seconds_after,
        );

        log::info!(
            "Decoded {} frames, matched {}, skipped {} duplicates; {} detections, {} events",
            report.frames_decoded,
            report.frames_matched,
            report.duplicates_skipped,
            report.detections.len(),
            report.events.len()
        );

        Ok(report)
    }
}
