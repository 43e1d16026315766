//! Platform backends for the capability traits in [`crate::services`]

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::{ScreenRegionCapture, UiaControl, UiaControlSource, WindowsInput};
