//! Merging of near-duplicate detections.
//!
//! A template that stays on screen for two seconds produces a detection on
//! almost every sampled frame. [`merge_detections`] keeps only the frames
//! that start a new appearance: detections within the separation window of
//! their comparison border are dropped.

use crate::config::MergeStrategy;

/// Seconds between two frame indices at an integer frame rate.
fn seconds_between(a: u64, b: u64, frames_per_second: u32) -> f64 {
    let fps = f64::from(frames_per_second);
    (a as f64 / fps - b as f64 / fps).abs()
}

/// Collapse detections closer than `min_separation_seconds` into one event.
///
/// `detections` must be strictly increasing. The first detection always
/// survives. With [`MergeStrategy::Adjacent`] each detection is compared with
/// the one directly before it in `detections`, whether or not that one
/// survived, so an unbroken run of close detections collapses into its first
/// frame however long the run is. With [`MergeStrategy::Anchored`] the
/// comparison border is the last surviving detection.
///
/// A `frames_per_second` of zero returns the input unchanged.
///
/// ```
/// use sightings::{MergeStrategy, merge_detections};
///
/// let merged = merge_detections(&[100, 105, 800], 30, 0.5, MergeStrategy::Adjacent);
/// assert_eq!(merged, vec![100, 800]);
/// ```
pub fn merge_detections(
    detections: &[u64],
    frames_per_second: u32,
    min_separation_seconds: f64,
    strategy: MergeStrategy,
) -> Vec<u64> {
    let Some((&first, rest)) = detections.split_first() else {
        return Vec::new();
    };
    if frames_per_second == 0 {
        return detections.to_vec();
    }

    let mut survivors = vec![first];
    let mut border = first;

    for &detection in rest {
        let close = seconds_between(detection, border, frames_per_second) <= min_separation_seconds;
        if !close {
            survivors.push(detection);
        }
        border = match strategy {
            MergeStrategy::Adjacent => detection,
            MergeStrategy::Anchored if !close => detection,
            MergeStrategy::Anchored => border,
        };
    }

    log::debug!(
        "Merged {} detections into {} events ({strategy:?}, window {min_separation_seconds}s)",
        detections.len(),
        survivors.len()
    );

    survivors
}
