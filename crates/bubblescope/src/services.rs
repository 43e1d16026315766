//! Capabilities the classification core consumes from the host environment
//!
//! Each trait is a thin seam over the operating system. The Windows backend
//! lives in [`crate::platforms`]; tests substitute in-memory doubles.

use crate::element::Control;
use crate::screenshot::CapturedImage;
use crate::types::{ClickType, Rect, VisualSignal};
use crate::AutomationError;
use std::path::Path;

/// Resolves native handles and enumerates top-level windows.
pub trait ControlSource {
    fn control_from_handle(&self, hwnd: isize) -> Result<Control, AutomationError>;

    /// Top-level windows with the given native class, optionally filtered by
    /// exact title.
    fn find_windows(
        &self,
        class_name: &str,
        title: Option<&str>,
    ) -> Result<Vec<Control>, AutomationError>;
}

/// Captures a screen region into a temporary image file.
pub trait ScreenshotService {
    /// The returned handle deletes the file when dropped.
    fn capture_region(&self, rect: Rect) -> Result<CapturedImage, AutomationError>;
}

pub trait ClipboardService {
    fn set_text(&self, text: &str) -> Result<(), AutomationError>;
}

/// Synthetic mouse and keyboard input.
pub trait InputInjector {
    /// Click at absolute screen coordinates.
    fn click_at(&self, x: i32, y: i32, click_type: ClickType) -> Result<(), AutomationError>;

    /// Mouse wheel at absolute screen coordinates; positive `notches` scroll up.
    fn scroll_at(&self, x: i32, y: i32, notches: i32) -> Result<(), AutomationError>;

    fn send_keys(&self, keys: &str) -> Result<(), AutomationError>;

    /// Click the centre of a control.
    fn click_control(&self, control: &Control, click_type: ClickType) -> Result<(), AutomationError> {
        let rect = control.bounding_rect()?;
        if !rect.is_usable() {
            return Err(AutomationError::StaleControl(
                "control has no clickable area".to_string(),
            ));
        }
        self.click_at(
            rect.center_x().round() as i32,
            rect.center_y().round() as i32,
            click_type,
        )
    }
}

/// Black-box pixel analysis of a bubble screenshot.
pub trait PixelDirectionDetector {
    fn detect(&self, image_path: &Path) -> Result<VisualSignal, AutomationError>;
}

/// Bundle of the services needed to classify and act on messages.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub screenshots: &'a dyn ScreenshotService,
    pub detector: &'a dyn PixelDirectionDetector,
    pub input: &'a dyn InputInjector,
}
