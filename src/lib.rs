//! # sightings
//!
//! Find when a template image is on screen in a video and report padded
//! time ranges.
//!
//! `sightings` decodes a video with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), matches sampled
//! frames against a grayscale template with a mean-subtracted correlation
//! coefficient
//! (via [`imageproc`](https://crates.io/crates/imageproc)), and turns the
//! frames where the template was found into a list of `HH:MM:SS` intervals.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sightings::{CorrelationMatcher, ScanConfig, Scanner, Template, VideoSource, to_json};
//!
//! let template = Template::open("concede_button.png")?;
//! let mut source = VideoSource::open("match.mp4")?;
//!
//! let config = ScanConfig::new().with_padding(3, 3);
//! let matcher = CorrelationMatcher::new(config.match_threshold());
//! let report = Scanner::new(&config, &matcher, &template).run(&mut source)?;
//!
//! println!("{}", to_json(&report.intervals)?);
//! # Ok::<(), sightings::SightingsError>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. **Sampling**: about ten frames per second of video are kept
//!    ([`Sampler`]); frames identical to the last kept one are skipped.
//! 2. **Detection**: a kept frame counts as "present" when the matcher finds
//!    between one and `max_templates_allowed` candidate regions
//!    ([`Detector`]).
//! 3. **Merging**: detections within half a second of the previous detection
//!    are folded into it ([`merge_detections`]).
//! 4. **Intervals**: each surviving detection becomes
//!    `[t - before, t + after]` in whole seconds ([`TimeInterval`]).
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed to build the crate.

pub mod config;
pub mod debounce;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod interval;
pub mod matcher;
pub mod metadata;
pub mod observer;
pub mod progress;
pub mod report;
pub mod sampler;
pub mod scan;
pub mod source;
pub mod template;
mod utilities;
pub mod video;

pub use config::{
    DEFAULT_MATCH_THRESHOLD, DEFAULT_MIN_SEPARATION_SECONDS, DEFAULT_SAMPLES_PER_SECOND,
    MergeStrategy, ScanConfig,
};
pub use debounce::merge_detections;
pub use detector::{Detector, FrameObserver, is_accepted};
pub use error::SightingsError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use interval::{TimeInterval, Timestamp, build_intervals};
pub use matcher::{CorrelationMatcher, MatchMetric, MatchRegion, Matcher};
pub use metadata::VideoMetadata;
pub use observer::{AnnotatedFrameWriter, LoggingObserver, ObserverChain};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use report::{to_json, write_json};
pub use sampler::{SampleDecision, Sampler};
pub use scan::{ScanReport, Scanner};
pub use source::{Frame, FrameSequence, FrameSource};
pub use template::Template;
pub use video::VideoSource;
