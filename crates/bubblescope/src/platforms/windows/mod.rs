//! Windows backend: UI Automation controls, SendInput, xcap screenshots

mod control;
mod input;
mod screenshot;

pub use control::{UiaControl, UiaControlSource};
pub use input::WindowsInput;
pub use screenshot::ScreenRegionCapture;
