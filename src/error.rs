//! Error types for the `sightings` crate.
//!
//! [`SightingsError`] is returned by every fallible operation: opening the
//! video, loading the template, decoding frames, and running a scan. Variants
//! carry the offending path or value so the binary can print them as-is.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `sightings` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SightingsError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The template image could not be loaded.
    #[error("Failed to load template image at {path}: {reason}")]
    TemplateLoad {
        /// Path that was passed to [`crate::Template::open`].
        path: PathBuf,
        /// Underlying reason the load failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The stream reports a frame rate that truncates to zero frames per second.
    #[error("Unusable frame rate: {0} fps")]
    InvalidFrameRate(f64),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A [`ScanConfig`](crate::ScanConfig) value is outside its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The scan was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for SightingsError {
    fn from(error: FfmpegError) -> Self {
        SightingsError::FfmpegError(error.to_string())
    }
}
