//! End-to-end scan tests over in-memory frame sequences.
//!
//! Frames are 2x2 grayscale images. Pixel (0, 0) holds the number of
//! candidate regions the scripted matcher should report; the other pixels
//! hold the frame index so no two frames are byte-identical unless a test
//! makes them so.

use std::cell::Cell;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, GrayImage, Luma};
use sightings::{
    CancellationToken, Frame, FrameObserver, FrameSequence, MatchRegion, Matcher,
    ProgressCallback, ProgressInfo, ScanConfig, Scanner, SightingsError, Template, to_json,
};

struct ScriptedMatcher {
    calls: Cell<usize>,
}

impl ScriptedMatcher {
    fn new() -> Self {
        Self { calls: Cell::new(0) }
    }
}

impl Matcher for ScriptedMatcher {
    fn find_regions(&self, frame: &GrayImage, template: &Template) -> Vec<MatchRegion> {
        self.calls.set(self.calls.get() + 1);
        let count = frame.get_pixel(0, 0)[0];
        (0..count)
            .map(|i| MatchRegion {
                x: u32::from(i),
                y: 0,
                width: template.width(),
                height: template.height(),
                score: 0.9,
            })
            .collect()
    }
}

#[derive(Default)]
struct SeenFrames(Vec<u64>);

impl FrameObserver for SeenFrames {
    fn on_frame_processed(&mut self, frame: &Frame, _regions: &[MatchRegion]) {
        self.0.push(frame.index());
    }
}

fn frame_image(index: u64, candidates: u8) -> DynamicImage {
    let mut image = GrayImage::new(2, 2);
    image.put_pixel(0, 0, Luma([candidates]));
    image.put_pixel(1, 0, Luma([(index & 0xff) as u8]));
    image.put_pixel(0, 1, Luma([((index >> 8) & 0xff) as u8]));
    DynamicImage::ImageLuma8(image)
}

/// `count` frames; frames listed in `hits` report one candidate.
fn sequence(fps: u32, count: u64, hits: &[u64]) -> FrameSequence {
    let images = (0..count)
        .map(|index| frame_image(index, u8::from(hits.contains(&index))))
        .collect();
    FrameSequence::new(fps, images).unwrap()
}

fn template() -> Template {
    Template::from_image(GrayImage::new(1, 1)).unwrap()
}

#[test]
fn no_candidates_yields_empty_output() {
    let config = ScanConfig::new().with_padding(3, 3);
    let matcher = ScriptedMatcher::new();
    let template = template();
    let mut source = sequence(30, 300, &[]);

    let report = Scanner::new(&config, &matcher, &template)
        .run(&mut source)
        .unwrap();

    assert!(report.detections.is_empty());
    assert!(report.intervals.is_empty());
    assert_eq!(to_json(&report.intervals).unwrap(), "[]");
}

#[test]
fn close_detections_merge_into_first() {
    // Stride 1 so frames 100 and 105 are both matched.
    let config = ScanConfig::new().with_samples_per_second(30).with_padding(0, 0);
    let matcher = ScriptedMatcher::new();
    let template = template();
    let mut source = sequence(30, 900, &[100, 105, 800]);

    let report = Scanner::new(&config, &matcher, &template)
        .run(&mut source)
        .unwrap();

    assert_eq!(report.detections, vec![100, 105, 800]);
    assert_eq!(report.events, vec![100, 800]);
    assert_eq!(report.intervals.len(), 2);
    assert_eq!(report.intervals[0].appear.to_string(), "00:00:03");
    assert_eq!(report.intervals[1].appear.to_string(), "00:00:26");
}

#[test]
fn padding_is_applied_around_event() {
    let config = ScanConfig::new().with_padding(3, 1);
    let matcher = ScriptedMatcher::new();
    let template = template();
    let mut source = sequence(30, 400, &[300]);

    let report = Scanner::new(&config, &matcher, &template)
        .run(&mut source)
        .unwrap();

    assert_eq!(report.events, vec![300]);
    let json = to_json(&report.intervals).unwrap();
    assert_eq!(
        json,
        "[\n    [\n        \"00:00:07\",\n        \"00:00:11\"\n    ]\n]"
    );
}

#[test]
fn repeated_runs_are_byte_identical() {
    let config = ScanConfig::new().with_padding(2, 2);
    let template = template();
    let hits = [30, 33, 36, 300, 303, 600];

    let outputs: Vec<String> = (0..2)
        .map(|_| {
            let matcher = ScriptedMatcher::new();
            let mut source = sequence(30, 700, &hits);
            let report = Scanner::new(&config, &matcher, &template)
                .run(&mut source)
                .unwrap();
            to_json(&report.intervals).unwrap()
        })
        .collect();

    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn stride_limits_submitted_frames() {
    let config = ScanConfig::new();
    let matcher = ScriptedMatcher::new();
    let template = template();
    let mut source = sequence(25, 100, &[]);
    let mut seen = SeenFrames::default();

    let report = Scanner::new(&config, &matcher, &template)
        .with_observer(&mut seen)
        .run(&mut source)
        .unwrap();

    assert_eq!(report.frames_decoded, 100);
    assert_eq!(report.frames_matched, 50);
    assert!(seen.0.iter().all(|index| index % 2 == 0));
    assert_eq!(seen.0.len(), 50);
}

#[test]
fn identical_frames_are_matched_once() {
    let config = ScanConfig::new().with_samples_per_second(30);
    let matcher = ScriptedMatcher::new();
    let template = template();

    let still = frame_image(0, 0);
    let mut source = FrameSequence::new(30, vec![still; 20]).unwrap();

    let report = Scanner::new(&config, &matcher, &template)
        .run(&mut source)
        .unwrap();

    assert_eq!(matcher.calls.get(), 1);
    assert_eq!(report.frames_matched, 1);
    assert_eq!(report.duplicates_skipped, 19);
}

#[test]
fn static_stretch_keeps_first_detection_only() {
    // A frame held still on screen is detected once, at its first frame.
    let config = ScanConfig::new().with_samples_per_second(30);
    let matcher = ScriptedMatcher::new();
    let template = template();

    let mut images: Vec<DynamicImage> = (0..10).map(|i| frame_image(i, 0)).collect();
    images.extend(std::iter::repeat_n(frame_image(10, 1), 10));
    let mut source = FrameSequence::new(30, images).unwrap();

    let report = Scanner::new(&config, &matcher, &template)
        .run(&mut source)
        .unwrap();

    assert_eq!(report.detections, vec![10]);
}

#[test]
fn too_many_candidates_is_absent() {
    let config = ScanConfig::new().with_samples_per_second(30);
    let matcher = ScriptedMatcher::new();
    let template = template();
    let images = vec![frame_image(0, 1), frame_image(1, 2), frame_image(2, 0)];
    let mut source = FrameSequence::new(30, images).unwrap();

    let report = Scanner::new(&config, &matcher, &template)
        .run(&mut source)
        .unwrap();

    assert_eq!(report.detections, vec![0]);
}

#[test]
fn raised_bound_accepts_multiple_candidates() {
    let config = ScanConfig::new()
        .with_samples_per_second(30)
        .with_max_templates_allowed(2);
    let matcher = ScriptedMatcher::new();
    let template = template();
    let images = vec![frame_image(0, 2), frame_image(1, 3)];
    let mut source = FrameSequence::new(30, images).unwrap();

    let report = Scanner::new(&config, &matcher, &template)
        .run(&mut source)
        .unwrap();

    assert_eq!(report.detections, vec![0]);
}

#[test]
fn cancelled_scan_returns_error() {
    let token = CancellationToken::new();
    token.cancel();
    let config = ScanConfig::new().with_cancellation(token);
    let matcher = ScriptedMatcher::new();
    let template = template();
    let mut source = sequence(30, 10, &[0]);

    let result = Scanner::new(&config, &matcher, &template).run(&mut source);

    assert!(matches!(result, Err(SightingsError::Cancelled)));
    assert_eq!(matcher.calls.get(), 0);
}

#[test]
fn invalid_config_is_rejected_before_decoding() {
    let config = ScanConfig::new().with_max_templates_allowed(0);
    let matcher = ScriptedMatcher::new();
    let template = template();
    let mut source = sequence(30, 10, &[0]);

    let result = Scanner::new(&config, &matcher, &template).run(&mut source);

    assert!(matches!(result, Err(SightingsError::InvalidConfiguration(_))));
    assert_eq!(matcher.calls.get(), 0);
}

struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

#[test]
fn progress_counts_every_decoded_frame() {
    let recorder = Arc::new(RecordingProgress {
        infos: Mutex::new(Vec::new()),
    });
    let config = ScanConfig::new()
        .with_progress(recorder.clone())
        .with_batch_size(10);
    let matcher = ScriptedMatcher::new();
    let template = template();
    let mut source = sequence(30, 45, &[3]);

    Scanner::new(&config, &matcher, &template)
        .run(&mut source)
        .unwrap();

    let infos = recorder.infos.lock().unwrap();
    let currents: Vec<u64> = infos.iter().map(|info| info.current).collect();
    assert_eq!(currents, vec![10, 20, 30, 40, 45]);
    for window in infos.windows(2) {
        assert!(window[1].current >= window[0].current);
    }
    let last = infos.last().unwrap();
    assert_eq!(last.total, Some(45));
    assert_eq!(last.detections, 1);
}
