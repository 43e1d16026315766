//! Temporary screenshot files
//!
//! Bubble screenshots only live for the duration of one direction check. A
//! [`CapturedImage`] owns its file and removes it on drop, whichever way the
//! check exits.

use crate::AutomationError;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

/// A screenshot stored in a temporary PNG file, deleted on drop.
#[derive(Debug)]
pub struct CapturedImage {
    path: Option<TempPath>,
    width: u32,
    height: u32,
}

impl CapturedImage {
    /// Encode `image` as PNG into a fresh temporary file.
    pub fn from_image(image: &DynamicImage) -> Result<Self, AutomationError> {
        let mut file = tempfile::Builder::new()
            .prefix("bubble_")
            .suffix(".png")
            .tempfile()?;
        image.write_to(&mut file, ImageFormat::Png)?;
        let path = file.into_temp_path();
        debug!(
            "Captured {}x{} bubble screenshot at {}",
            image.width(),
            image.height(),
            path.display()
        );
        Ok(Self {
            path: Some(path),
            width: image.width(),
            height: image.height(),
        })
    }

    /// Take ownership of an image file written by someone else.
    pub fn adopt(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, AutomationError> {
        Ok(Self {
            path: Some(TempPath::try_from_path(path.as_ref().to_path_buf())?),
            width,
            height,
        })
    }

    pub fn path(&self) -> &Path {
        match &self.path {
            Some(path) => path,
            None => Path::new(""),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for CapturedImage {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let shown = path.display().to_string();
            if let Err(e) = path.close() {
                warn!(path = %shown, error = %e, "Failed to delete bubble screenshot");
            }
        }
    }
}
