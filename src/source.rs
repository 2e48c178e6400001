//! Frames and the sources that produce them.
//!
//! The scan pipeline only needs three things from a video: its integer frame
//! rate, an (estimated) frame count, and the frames themselves in decode
//! order. [`FrameSource`] captures exactly that, so the pipeline runs the
//! same way over an FFmpeg-decoded file ([`VideoSource`](crate::VideoSource))
//! and over an in-memory [`FrameSequence`].

use std::collections::VecDeque;

use image::{DynamicImage, GenericImageView, GrayImage};

use crate::error::SightingsError;

/// A single decoded frame.
///
/// `index` counts decode calls from zero; it is not derived from the
/// container's presentation timestamps.
#[derive(Debug, Clone)]
pub struct Frame {
    index: u64,
    image: DynamicImage,
}

impl Frame {
    pub fn new(index: u64, image: DynamicImage) -> Self {
        Self { index, image }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// The 8-bit grayscale view used for matching.
    pub fn to_grayscale(&self) -> GrayImage {
        self.image.to_luma8()
    }

    /// `true` if both frames have the same dimensions, colour type and
    /// pixel bytes.
    pub fn is_identical_to(&self, other: &Frame) -> bool {
        self.image.dimensions() == other.image.dimensions()
            && self.image.color() == other.image.color()
            && self.image.as_bytes() == other.image.as_bytes()
    }
}

/// A sequential supplier of frames.
pub trait FrameSource {
    /// Whole frames per second. Always at least 1.
    fn frames_per_second(&self) -> u32;

    /// Total frames the source expects to yield. May be an estimate.
    fn frame_count(&self) -> u64;

    /// Decode the next frame, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, SightingsError>;
}

/// An in-memory [`FrameSource`] over pre-decoded images.
///
/// Useful for tests, benchmarks, and callers that already hold decoded
/// frames.
///
/// ```
/// use image::{DynamicImage, GrayImage};
/// use sightings::{FrameSequence, FrameSource};
///
/// let blank = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
/// let mut source = FrameSequence::new(30, vec![blank.clone(), blank])?;
/// assert_eq!(source.frame_count(), 2);
/// assert_eq!(source.next_frame()?.unwrap().index(), 0);
/// # Ok::<(), sightings::SightingsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames_per_second: u32,
    frame_count: u64,
    next_index: u64,
    images: VecDeque<DynamicImage>,
}

impl FrameSequence {
    /// # Errors
    ///
    /// Returns [`SightingsError::InvalidFrameRate`] if `frames_per_second`
    /// is zero.
    pub fn new(frames_per_second: u32, images: Vec<DynamicImage>) -> Result<Self, SightingsError> {
        if frames_per_second == 0 {
            return Err(SightingsError::InvalidFrameRate(0.0));
        }
        Ok(Self {
            frames_per_second,
            frame_count: images.len() as u64,
            next_index: 0,
            images: images.into(),
        })
    }
}

impl FrameSource for FrameSequence {
    fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SightingsError> {
        Ok(self.images.pop_front().map(|image| {
            let frame = Frame::new(self.next_index, image);
            self.next_index += 1;
            frame
        }))
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, RgbImage};

    use super::*;

    #[test]
    fn identical_frames_compare_equal() {
        let a = Frame::new(0, DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([7]))));
        let b = Frame::new(9, DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([7]))));
        assert!(a.is_identical_to(&b));
    }

    #[test]
    fn colour_type_matters() {
        let gray = Frame::new(0, DynamicImage::ImageLuma8(GrayImage::new(3, 3)));
        let rgb = Frame::new(0, DynamicImage::ImageRgb8(RgbImage::new(3, 3)));
        assert!(!gray.is_identical_to(&rgb));
    }

    #[test]
    fn one_pixel_difference_is_detected() {
        let a = GrayImage::new(5, 5);
        let mut b = a.clone();
        b.put_pixel(4, 4, Luma([1]));
        let a = Frame::new(0, DynamicImage::ImageLuma8(a));
        let b = Frame::new(1, DynamicImage::ImageLuma8(b));
        assert!(!a.is_identical_to(&b));
    }

    #[test]
    fn sequence_rejects_zero_fps() {
        assert!(matches!(
            FrameSequence::new(0, Vec::new()),
            Err(SightingsError::InvalidFrameRate(_))
        ));
    }

    #[test]
    fn sequence_numbers_frames_from_zero() {
        let blank = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        let mut source = FrameSequence::new(25, vec![blank.clone(); 3]).unwrap();
        let mut indices = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            indices.push(frame.index());
        }
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(source.next_frame().unwrap().is_none());
    }
}
