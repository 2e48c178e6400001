//! Ready-made [`FrameObserver`]s for debugging a scan.
//!
//! [`LoggingObserver`] writes one `log` line per matched frame.
//! [`AnnotatedFrameWriter`] saves frames that produced candidate regions as
//! PNGs with every region outlined, which is the quickest way to see why a
//! threshold is too loose.

use std::path::{Path, PathBuf};

use image::Rgb;
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::{detector::FrameObserver, error::SightingsError, matcher::MatchRegion, source::Frame};

const OUTLINE: Rgb<u8> = Rgb([255, 0, 255]);

/// Logs every matched frame at `debug` level.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl FrameObserver for LoggingObserver {
    fn on_frame_processed(&mut self, frame: &Frame, regions: &[MatchRegion]) {
        if regions.is_empty() {
            log::debug!("frame {}: no candidates", frame.index());
            return;
        }
        for region in regions {
            log::debug!(
                "frame {}: candidate at ({}, {}) score {:.3}",
                frame.index(),
                region.x,
                region.y,
                region.score
            );
        }
    }
}

/// Saves `frame_NNNNNN.png` into a directory for each frame with at least
/// one candidate region, outlining the regions.
#[derive(Debug)]
pub struct AnnotatedFrameWriter {
    directory: PathBuf,
    written: usize,
}

impl AnnotatedFrameWriter {
    /// Create the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SightingsError::IoError`] if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self, SightingsError> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            written: 0,
        })
    }

    /// Number of annotated frames saved so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn save(&self, frame: &Frame, regions: &[MatchRegion]) -> Result<PathBuf, SightingsError> {
        let mut canvas = frame.image().to_rgb8();
        for region in regions {
            let rect = Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height);
            draw_hollow_rect_mut(&mut canvas, rect, OUTLINE);
        }
        let path = self.directory.join(format!("frame_{:06}.png", frame.index()));
        canvas.save(&path)?;
        Ok(path)
    }
}

impl FrameObserver for AnnotatedFrameWriter {
    fn on_frame_processed(&mut self, frame: &Frame, regions: &[MatchRegion]) {
        if regions.is_empty() {
            return;
        }
        // Observers cannot fail the scan; a lost debug image is only logged.
        match self.save(frame, regions) {
            Ok(path) => {
                self.written += 1;
                log::debug!("saved annotated frame {}", path.display());
            }
            Err(error) => log::warn!("could not save annotated frame {}: {error}", frame.index()),
        }
    }
}

/// Forwards each notification to several observers in order.
#[derive(Default)]
pub struct ObserverChain<'a> {
    observers: Vec<&'a mut dyn FrameObserver>,
}

impl<'a> ObserverChain<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, observer: &'a mut dyn FrameObserver) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl FrameObserver for ObserverChain<'_> {
    fn on_frame_processed(&mut self, frame: &Frame, regions: &[MatchRegion]) {
        for observer in self.observers.iter_mut() {
            observer.on_frame_processed(frame, regions);
        }
    }
}
