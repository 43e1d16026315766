//! Synthetic mouse, keyboard and clipboard input for Windows

use crate::services::{ClipboardService, InputInjector};
use crate::types::ClickType;
use crate::AutomationError;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::debug;
use uiautomation::inputs::Keyboard;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEEVENTF_WHEEL, MOUSEINPUT, MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

/// One wheel notch.
const WHEEL_DELTA: i32 = 120;

/// `SendInput` mouse, `uiautomation` keyboard and `arboard` clipboard.
pub struct WindowsInput {
    clipboard: Mutex<Option<arboard::Clipboard>>,
    /// Pause after each injected action so the UI can react
    pub settle: Duration,
}

impl Default for WindowsInput {
    fn default() -> Self {
        Self {
            clipboard: Mutex::new(None),
            settle: Duration::from_millis(50),
        }
    }
}

impl WindowsInput {
    pub fn new() -> Self {
        Self::default()
    }
}

fn mouse_input(dx: i32, dy: i32, mouse_data: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: mouse_data as _,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Screen coordinates to the 0..=65535 range used by `MOUSEEVENTF_ABSOLUTE`.
fn normalize(x: i32, y: i32) -> (i32, i32) {
    let (width, height) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    let width = width.max(1) as f64;
    let height = height.max(1) as f64;
    (
        ((x as f64 * 65535.0) / width) as i32,
        ((y as f64 * 65535.0) / height) as i32,
    )
}

fn send(inputs: &[INPUT]) -> Result<(), AutomationError> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(AutomationError::ActionFailed(format!(
            "SendInput delivered {} of {} events",
            sent,
            inputs.len()
        )));
    }
    Ok(())
}

impl InputInjector for WindowsInput {
    fn click_at(&self, x: i32, y: i32, click_type: ClickType) -> Result<(), AutomationError> {
        let (abs_x, abs_y) = normalize(x, y);
        let (down_flag, up_flag) = match click_type {
            ClickType::Left | ClickType::Double => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            ClickType::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
        };

        let move_input = mouse_input(abs_x, abs_y, 0, MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE);
        let down_input = mouse_input(abs_x, abs_y, 0, MOUSEEVENTF_ABSOLUTE | down_flag);
        let up_input = mouse_input(abs_x, abs_y, 0, MOUSEEVENTF_ABSOLUTE | up_flag);

        debug!("{:?} click at ({}, {})", click_type, x, y);
        send(&[move_input, down_input, up_input])?;
        if click_type == ClickType::Double {
            thread::sleep(Duration::from_millis(50));
            send(&[down_input, up_input])?;
        }
        thread::sleep(self.settle);
        Ok(())
    }

    fn scroll_at(&self, x: i32, y: i32, notches: i32) -> Result<(), AutomationError> {
        let (abs_x, abs_y) = normalize(x, y);
        let move_input = mouse_input(abs_x, abs_y, 0, MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE);
        let wheel_input = mouse_input(0, 0, notches * WHEEL_DELTA, MOUSEEVENTF_WHEEL);
        debug!("Scroll {} notch(es) at ({}, {})", notches, x, y);
        send(&[move_input, wheel_input])?;
        thread::sleep(self.settle);
        Ok(())
    }

    fn send_keys(&self, keys: &str) -> Result<(), AutomationError> {
        Keyboard::new()
            .send_keys(keys)
            .map_err(|e| AutomationError::ActionFailed(format!("Failed to send keys: {e}")))?;
        thread::sleep(self.settle);
        Ok(())
    }
}

impl ClipboardService for WindowsInput {
    fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        let mut guard = self
            .clipboard
            .lock()
            .map_err(|e| AutomationError::Internal(format!("Clipboard lock poisoned: {e}")))?;
        if guard.is_none() {
            let clipboard = arboard::Clipboard::new().map_err(|e| {
                AutomationError::PlatformError(format!("Failed to open clipboard: {e}"))
            })?;
            *guard = Some(clipboard);
        }
        let clipboard = guard
            .as_mut()
            .ok_or_else(|| AutomationError::Internal("clipboard not initialized".to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| AutomationError::ActionFailed(format!("Failed to set clipboard: {e}")))
    }
}
