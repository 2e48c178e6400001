//! Frame sampling.
//!
//! Matching every frame of a 60 fps recording is wasted work for an on-screen
//! element that stays up for seconds. The [`Sampler`] keeps roughly
//! `samples_per_second` frames per second of video (every `stride`-th frame)
//! and drops frames that are byte-identical to the last frame it kept, which
//! removes static stretches such as pause screens.

use crate::source::Frame;

/// What the sampler decided about one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDecision {
    /// The frame index is not a multiple of the stride.
    OffStride,
    /// The frame is identical to the last retained frame.
    Duplicate,
    /// The frame must be matched. It is now the retained frame.
    Submit,
}

/// Stride throttling plus identical-frame elision.
///
/// The comparison frame is the last one *submitted*, not the last one seen:
/// off-stride frames never replace it.
#[derive(Debug)]
pub struct Sampler {
    stride: u64,
    retained: Option<Frame>,
}

impl Sampler {
    /// `stride = max(1, frames_per_second / samples_per_second)`, using
    /// integer division.
    pub fn new(frames_per_second: u32, samples_per_second: u32) -> Self {
        let stride = (frames_per_second / samples_per_second.max(1)).max(1);
        Self {
            stride: u64::from(stride),
            retained: None,
        }
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Decide whether `frame` should be matched. On [`SampleDecision::Submit`]
    /// the frame becomes the retained frame, available via
    /// [`retained`](Sampler::retained).
    pub fn offer(&mut self, frame: Frame) -> SampleDecision {
        if frame.index() % self.stride != 0 {
            return SampleDecision::OffStride;
        }

        if let Some(previous) = &self.retained
            && previous.is_identical_to(&frame)
        {
            return SampleDecision::Duplicate;
        }

        self.retained = Some(frame);
        SampleDecision::Submit
    }

    /// The last submitted frame.
    pub fn retained(&self) -> Option<&Frame> {
        self.retained.as_ref()
    }
}
