use crate::screenshot::CapturedImage;
use crate::services::ScreenshotService;
use crate::types::Rect;
use crate::AutomationError;
use image::DynamicImage;
use tracing::debug;
use xcap::Monitor;

/// Captures the monitor under a rectangle and crops it to that rectangle.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenRegionCapture;

impl ScreenshotService for ScreenRegionCapture {
    fn capture_region(&self, rect: Rect) -> Result<CapturedImage, AutomationError> {
        if !rect.is_usable() {
            return Err(AutomationError::InvalidArgument(format!(
                "cannot capture empty region {rect:?}"
            )));
        }

        let monitor = Monitor::from_point(rect.center_x() as i32, rect.center_y() as i32)
            .map_err(|e| AutomationError::PlatformError(format!("Failed to find monitor: {e}")))?;
        let origin_x = monitor
            .x()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to get monitor x: {e}")))?;
        let origin_y = monitor
            .y()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to get monitor y: {e}")))?;
        let image = monitor
            .capture_image()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to capture monitor: {e}")))?;

        let x = (rect.left - origin_x).max(0) as u32;
        let y = (rect.top - origin_y).max(0) as u32;
        let width = (rect.width() as u32).min(image.width().saturating_sub(x));
        let height = (rect.height() as u32).min(image.height().saturating_sub(y));
        if width == 0 || height == 0 {
            return Err(AutomationError::InvalidArgument(format!(
                "region {rect:?} lies outside the monitor"
            )));
        }

        debug!("Cropping {}x{} at ({}, {}) from monitor capture", width, height, x, y);
        let cropped = DynamicImage::ImageRgba8(image).crop_imm(x, y, width, height);
        CapturedImage::from_image(&cropped)
    }
}
