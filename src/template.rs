//! The reference image being searched for.

use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::error::SightingsError;

/// A grayscale template, loaded once and shared read-only by every matcher
/// call.
#[derive(Debug, Clone)]
pub struct Template {
    image: GrayImage,
    path: Option<PathBuf>,
}

impl Template {
    /// Load a template from any format the `image` crate can decode,
    /// converting it to 8-bit grayscale.
    ///
    /// # Errors
    ///
    /// Returns [`SightingsError::TemplateLoad`] if the file is missing,
    /// unreadable, or empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SightingsError> {
        let path = path.as_ref();
        log::debug!("Loading template: {}", path.display());

        let image = image::open(path).map_err(|error| SightingsError::TemplateLoad {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

        let template = Self::from_image(image.to_luma8()).map_err(|_| {
            SightingsError::TemplateLoad {
                path: path.to_path_buf(),
                reason: "image has zero width or height".to_string(),
            }
        })?;

        log::info!(
            "Loaded template {} ({}x{})",
            path.display(),
            template.width(),
            template.height()
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            ..template
        })
    }

    /// Wrap an already-decoded grayscale image.
    ///
    /// # Errors
    ///
    /// Returns [`SightingsError::InvalidConfiguration`] for an empty image.
    pub fn from_image(image: GrayImage) -> Result<Self, SightingsError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SightingsError::InvalidConfiguration(
                "template image must not be empty".to_string(),
            ));
        }
        Ok(Self { image, path: None })
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Where the template was loaded from, if it came from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
