//! Classifier configuration
//!
//! One explicit value threaded through every entry point. It carries the host
//! application's UI class names, the localised name markers, and every tunable
//! threshold of the direction pipeline. Load it from JSON or the environment,
//! or start from [`ClassifierConfig::default`].

use crate::types::Direction;
use crate::AutomationError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Env var naming a JSON file with a full or partial configuration.
pub const CONFIG_PATH_ENV: &str = "BUBBLESCOPE_CONFIG";
/// Env var toggling content-hash identity (`1` / `true`).
pub const MESSAGE_HASH_ENV: &str = "BUBBLESCOPE_MESSAGE_HASH";

/// Class names exposed by the messenger's accessibility tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiClassNames {
    /// Native class of the top-level windows
    pub window: String,
    pub main_window: String,
    pub sub_window: String,
    pub chat_page: String,
    pub chat_splitter: String,
    /// Scrollable list holding the bubbles of the open conversation
    pub message_list: String,
    pub bubble_item: String,
    pub text_item: String,
    pub refer_item: String,
    pub voice_item: String,
    pub personal_card_item: String,
}

impl Default for UiClassNames {
    fn default() -> Self {
        Self {
            window: "Qt51514QWindowIcon".to_string(),
            main_window: "mmui::MainWindow".to_string(),
            sub_window: "mmui::FramelessMainWindow".to_string(),
            chat_page: "mmui::ChatMessagePage".to_string(),
            chat_splitter: "mmui::XSplitterView".to_string(),
            message_list: "mmui::MessageView".to_string(),
            bubble_item: "mmui::ChatBubbleItemView".to_string(),
            text_item: "mmui::ChatTextItemView".to_string(),
            refer_item: "mmui::ChatBubbleReferItemView".to_string(),
            voice_item: "mmui::ChatVoiceItemView".to_string(),
            personal_card_item: "mmui::ChatPersonalCardItemView".to_string(),
        }
    }
}

impl UiClassNames {
    /// Classes whose rectangle is the visible bubble itself.
    pub fn is_bubble_class(&self, class_name: &str) -> bool {
        class_name == self.bubble_item
            || class_name == self.text_item
            || class_name == self.refer_item
    }
}

/// Localised accessible-name markers used by the type cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageMarkers {
    pub link_prefix: String,
    pub location_prefix: String,
    /// Includes the trailing newline that separates the label from the file name
    pub file_prefix: String,
    pub video_prefix: String,
    pub image_name: String,
    pub animated_emoji_name: String,
    /// Any name containing this substring is an emoji
    pub emoji_marker: String,
    /// Chat "who" values that are really input placeholders
    pub ignored_chat_names: Vec<String>,
    /// Sender shown for the account's own messages
    pub self_sender_name: String,
}

impl Default for MessageMarkers {
    fn default() -> Self {
        Self {
            link_prefix: "[链接]".to_string(),
            location_prefix: "位置".to_string(),
            file_prefix: "文件\n".to_string(),
            video_prefix: "视频".to_string(),
            image_name: "图片".to_string(),
            animated_emoji_name: "动画表情".to_string(),
            emoji_marker: "表情".to_string(),
            ignored_chat_names: vec!["输入".to_string(), "请输入".to_string()],
            self_sender_name: "我".to_string(),
        }
    }
}

/// Thresholds of the geometry/position analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryThresholds {
    /// A control this close to the container width is a wrapper, not a bubble
    pub wrapper_tolerance_px: i32,
    /// Real bubbles stay below this share of the container width
    pub bubble_max_width_ratio: f64,
    /// `|ratio|` at or below this is "near the centre"
    pub center_dead_zone: f64,
    pub near_center_confidence: f64,
    /// Size of the index window centred on the control
    pub neighbor_window: usize,
    /// Average neighbor offset needed before the fallback commits to a side
    pub neighbor_min_offset_px: f64,
}

impl Default for GeometryThresholds {
    fn default() -> Self {
        Self {
            wrapper_tolerance_px: 10,
            bubble_max_width_ratio: 0.9,
            center_dead_zone: 0.05,
            near_center_confidence: 0.3,
            neighbor_window: 3,
            neighbor_min_offset_px: 50.0,
        }
    }
}

/// Thresholds of the direction arbiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterThresholds {
    /// Position confidence above which the geometry wins outright
    pub position_trust: f64,
    /// Visual distance below which the pixel detector is trusted on its own
    pub visual_strong_px: f64,
    /// Visual distance below which the pixel detector is still plausible
    pub visual_plausible_px: f64,
    /// Score reported for a geometry direction that carries zero confidence
    pub weak_position_score: f64,
    /// Used only when neither geometry nor pixels produced any direction
    pub last_resort_direction: Direction,
}

impl Default for ArbiterThresholds {
    fn default() -> Self {
        Self {
            position_trust: 0.2,
            visual_strong_px: 50.0,
            visual_plausible_px: 200.0,
            weak_position_score: 100.0,
            last_resort_direction: Direction::Right,
        }
    }
}

/// Full configuration for classification, identity and message actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub class_names: UiClassNames,
    pub markers: MessageMarkers,
    pub geometry: GeometryThresholds,
    pub arbiter: ArbiterThresholds,
    /// Surface `hash` as a public field and use it for identity
    pub message_hash: bool,
    /// Horizontal click offset from the bubble's anchored edge
    pub message_xbias: i32,
    /// Vertical click offset from the bubble's top edge
    pub message_ybias: i32,
    pub max_scroll_attempts: u32,
    /// Wheel notches per scroll step while rolling a bubble into view
    pub scroll_step: i32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            class_names: UiClassNames::default(),
            markers: MessageMarkers::default(),
            geometry: GeometryThresholds::default(),
            arbiter: ArbiterThresholds::default(),
            message_hash: false,
            message_xbias: 45,
            message_ybias: 30,
            max_scroll_attempts: 30,
            scroll_step: 3,
        }
    }
}

impl ClassifierConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded classifier config from {}", path.display());
        Ok(config)
    }

    /// Defaults, overridden by `BUBBLESCOPE_CONFIG` and `BUBBLESCOPE_MESSAGE_HASH`.
    pub fn from_env() -> Result<Self, AutomationError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(path.trim())?,
            _ => Self::default(),
        };

        if let Ok(value) = std::env::var(MESSAGE_HASH_ENV) {
            config.message_hash = value == "1" || value.eq_ignore_ascii_case("true");
            info!(
                "Content-hash identity {} via {}",
                if config.message_hash { "enabled" } else { "disabled" },
                MESSAGE_HASH_ENV
            );
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AutomationError> {
        let g = &self.geometry;
        if !(0.0..=1.0).contains(&g.bubble_max_width_ratio) {
            return Err(AutomationError::Config(format!(
                "bubble_max_width_ratio must be within [0, 1], got {}",
                g.bubble_max_width_ratio
            )));
        }
        if g.wrapper_tolerance_px < 0 {
            return Err(AutomationError::Config(
                "wrapper_tolerance_px must not be negative".to_string(),
            ));
        }
        if g.neighbor_window == 0 {
            return Err(AutomationError::Config(
                "neighbor_window must be at least 1".to_string(),
            ));
        }
        if self.arbiter.visual_strong_px > self.arbiter.visual_plausible_px {
            return Err(AutomationError::Config(
                "visual_strong_px must not exceed visual_plausible_px".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.message_hash);
        assert_eq!(config.geometry.wrapper_tolerance_px, 10);
        assert_eq!(config.arbiter.visual_strong_px, 50.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"message_hash": true, "geometry": {{"neighbor_window": 5}}}}"#
        )
        .unwrap();

        let config = ClassifierConfig::from_json_file(file.path()).unwrap();
        assert!(config.message_hash);
        assert_eq!(config.geometry.neighbor_window, 5);
        assert_eq!(config.geometry.wrapper_tolerance_px, 10);
        assert_eq!(config.class_names, UiClassNames::default());
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let mut config = ClassifierConfig::default();
        config.geometry.bubble_max_width_ratio = 1.5;
        assert!(matches!(config.validate(), Err(AutomationError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ClassifierConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, AutomationError::Config(_)));
    }

    #[test]
    fn test_bubble_classes() {
        let names = UiClassNames::default();
        assert!(names.is_bubble_class("mmui::ChatTextItemView"));
        assert!(names.is_bubble_class("mmui::ChatBubbleReferItemView"));
        assert!(!names.is_bubble_class("mmui::ChatVoiceItemView"));
    }
}
