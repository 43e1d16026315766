//! Pixel-based direction detection
//!
//! The default [`PixelDirectionDetector`]: find where the bubble starts when
//! scanning the screenshot from each edge and report the nearer edge.

use crate::services::PixelDirectionDetector;
use crate::types::{Direction, VisualSignal};
use crate::AutomationError;
use image::{Rgb, RgbImage};
use std::path::Path;
use tracing::debug;

/// Scans a horizontal band around the vertical middle of the image for the
/// first column that differs from the background colour.
#[derive(Debug, Clone)]
pub struct EdgeScanDetector {
    /// Sum of absolute channel differences counted as "not background"
    pub color_tolerance: u32,
    /// Number of rows sampled around the middle
    pub band_rows: u32,
}

impl Default for EdgeScanDetector {
    fn default() -> Self {
        Self {
            color_tolerance: 30,
            band_rows: 5,
        }
    }
}

impl EdgeScanDetector {
    /// Run the scan on an already decoded image.
    pub fn detect_image(&self, image: &RgbImage) -> Result<VisualSignal, AutomationError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AutomationError::InvalidArgument(
                "empty screenshot".to_string(),
            ));
        }

        let background = *image.get_pixel(0, 0);
        let rows = self.sample_rows(height);

        let from_left = (0..width).find(|&x| self.column_differs(image, x, &rows, &background));
        let from_right = (0..width)
            .rev()
            .find(|&x| self.column_differs(image, x, &rows, &background))
            .map(|x| width - 1 - x);

        let (Some(left_idx), Some(right_idx)) = (from_left, from_right) else {
            return Err(AutomationError::InvalidArgument(
                "screenshot has no foreground".to_string(),
            ));
        };

        debug!(
            "Edge scan: left_idx={}, right_idx={}, width={}",
            left_idx, right_idx, width
        );

        let signal = if left_idx <= right_idx {
            VisualSignal {
                direction: Direction::Left,
                distance: left_idx as f64,
            }
        } else {
            VisualSignal {
                direction: Direction::Right,
                distance: right_idx as f64,
            }
        };
        Ok(signal)
    }

    fn sample_rows(&self, height: u32) -> Vec<u32> {
        let middle = height / 2;
        let half = self.band_rows / 2;
        let start = middle.saturating_sub(half);
        let end = (middle + half + 1).min(height);
        (start..end).collect()
    }

    fn column_differs(&self, image: &RgbImage, x: u32, rows: &[u32], background: &Rgb<u8>) -> bool {
        rows.iter().any(|&y| {
            let pixel = image.get_pixel(x, y);
            color_distance(pixel, background) > self.color_tolerance
        })
    }
}

impl PixelDirectionDetector for EdgeScanDetector {
    fn detect(&self, image_path: &Path) -> Result<VisualSignal, AutomationError> {
        let image = image::open(image_path)?.to_rgb8();
        self.detect_image(&image)
    }
}

fn color_distance(a: &Rgb<u8>, b: &Rgb<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(x, y)| (*x as i32 - *y as i32).unsigned_abs())
        .sum()
}
