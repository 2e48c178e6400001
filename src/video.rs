//! FFmpeg-backed [`FrameSource`].
//!
//! [`VideoSource`] opens a file, picks the best video stream, and decodes it
//! front to back one frame per [`next_frame`](FrameSource::next_frame) call.
//! There is no seeking: template scanning touches every frame anyway, and
//! decoding sequentially keeps frame indices equal to decode order.
//!
//! # Example
//!
//! ```no_run
//! use sightings::{FrameSource, SightingsError, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! println!("{} fps, ~{} frames", source.frames_per_second(), source.frame_count());
//! while let Some(frame) = source.next_frame()? {
//!     let _gray = frame.to_grayscale();
//! }
//! # Ok::<(), SightingsError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{
    error::SightingsError,
    metadata::{VideoMetadata, estimate_frame_count},
    source::{Frame, FrameSource},
    utilities::{frame_to_buffer, rational_to_f64},
};

/// Sequential decoder over the best video stream of a media file.
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    /// Built from the first decoded frame and rebuilt if the decoder
    /// changes format or size mid-stream.
    scaler: Option<(ScalingContext, Pixel, u32, u32)>,
    video_stream_index: usize,
    metadata: VideoMetadata,
    frames_per_second: u32,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    next_index: u64,
    eof_sent: bool,
    done: bool,
    file_path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("file_path", &self.file_path)
            .field("video_stream_index", &self.video_stream_index)
            .field("metadata", &self.metadata)
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file and prepare its best video stream for decoding.
    ///
    /// # Errors
    ///
    /// - [`SightingsError::FileOpen`] if FFmpeg cannot open the file or build
    ///   a decoder for its video stream.
    /// - [`SightingsError::NoVideoStream`] if the file has no video stream.
    /// - [`SightingsError::InvalidFrameRate`] if the stream's frame rate is
    ///   below one frame per second.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SightingsError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| SightingsError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| SightingsError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(SightingsError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
            SightingsError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to read video codec parameters: {error}"),
            }
        })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| SightingsError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let frames_per_second = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frame_count = estimate_frame_count(stream.frames(), duration, frames_per_second);

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        let whole_fps = metadata.whole_frames_per_second();
        if whole_fps == 0 {
            return Err(SightingsError::InvalidFrameRate(frames_per_second));
        }

        log::info!(
            "Opened {}: {}x{} @ {:.3} fps, {} frames, codec {}",
            file_path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            metadata,
            frames_per_second: whole_fps,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            next_index: 0,
            eof_sent: false,
            done: false,
            file_path,
        })
    }

    /// Cached metadata for the selected video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Convert the frame currently held in `decoded_frame` to RGB.
    fn convert_current_frame(&mut self) -> Result<DynamicImage, SightingsError> {
        let format = self.decoded_frame.format();
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();

        let stale = !matches!(
            &self.scaler,
            Some((_, f, w, h)) if *f == format && *w == width && *h == height
        );
        if stale {
            log::debug!("Building scaler for {format:?} {width}x{height}");
            let context = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some((context, format, width, height));
        }

        let Some((scaler, ..)) = self.scaler.as_mut() else {
            return Err(SightingsError::VideoDecodeError(
                "Scaler unavailable".to_string(),
            ));
        };
        scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let buffer = frame_to_buffer(&self.rgb_frame, width, height, 3);
        let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            SightingsError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }
}

impl FrameSource for VideoSource {
    fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    fn frame_count(&self) -> u64 {
        self.metadata.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SightingsError> {
        if self.done {
            return Ok(None);
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let image = self.convert_current_frame()?;
                let frame = Frame::new(self.next_index, image);
                self.next_index += 1;
                return Ok(Some(frame));
            }

            if self.eof_sent {
                log::debug!("Decoder drained after {} frames", self.next_index);
                self.done = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .map_err(|e| SightingsError::VideoDecodeError(e.to_string()))?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    self.done = true;
                    return Err(SightingsError::VideoDecodeError(format!(
                        "Failed to read packet after frame {}: {error}",
                        self.next_index
                    )));
                }
            }
        }
    }
}
