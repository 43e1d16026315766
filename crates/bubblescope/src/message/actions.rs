use super::MessageRecord;
use crate::config::ClassifierConfig;
use crate::registry::WindowRegistry;
use crate::services::{ClipboardService, InputInjector};
use crate::types::{Attribution, ClickType, Rect};
use crate::AutomationError;
use std::time::Duration;
use tracing::{debug, instrument};

impl MessageRecord {
    /// Live/Stale probe. Re-queries the control on every call.
    pub fn exists(&self) -> bool {
        self.control.is_live()
    }

    pub fn click(&self, input: &dyn InputInjector, config: &ClassifierConfig) -> Result<(), AutomationError> {
        self.click_with_bias(input, config, config.message_xbias * 2, ClickType::Left)
    }

    /// Opens the context menu of the bubble.
    pub fn right_click(
        &self,
        input: &dyn InputInjector,
        config: &ClassifierConfig,
    ) -> Result<(), AutomationError> {
        self.click_with_bias(input, config, config.message_xbias, ClickType::Right)
    }

    pub fn double_click(
        &self,
        input: &dyn InputInjector,
        config: &ClassifierConfig,
    ) -> Result<(), AutomationError> {
        self.click_with_bias(input, config, config.message_xbias * 2, ClickType::Double)
    }

    /// Put the extracted content on the clipboard. Needs a live control so a
    /// record from an old scan is not mistaken for what is on screen.
    pub fn copy_content(&self, clipboard: &dyn ClipboardService) -> Result<(), AutomationError> {
        if !self.exists() {
            return Err(stale());
        }
        clipboard.set_text(&self.header.content)
    }

    /// Scroll the chat's message list until the bubble lies vertically inside it.
    #[instrument(level = "debug", skip(self, registry, input, config), fields(message = %self.summary()))]
    pub fn roll_into_view(
        &self,
        registry: &WindowRegistry,
        input: &dyn InputInjector,
        config: &ClassifierConfig,
    ) -> Result<(), AutomationError> {
        let container = &registry
            .chat(self.chat)
            .ok_or_else(|| AutomationError::InvalidArgument(format!("unknown {}", self.chat)))?
            .container;

        for attempt in 0..=config.max_scroll_attempts {
            if !self.exists() {
                return Err(stale());
            }
            let list = container.bounding_rect()?;
            let rect = self.control.bounding_rect()?;
            if rect.is_usable() && list.contains_rows_of(&rect) {
                debug!("Message in view after {} scroll(s)", attempt);
                return Ok(());
            }
            if attempt == config.max_scroll_attempts {
                break;
            }
            // Off-screen bubbles below the list are scrolled down; anything
            // else, including bubbles without a usable rectangle, up.
            let notches = if rect.is_usable() && rect.top >= list.top {
                -config.scroll_step
            } else {
                config.scroll_step
            };
            input.scroll_at(
                list.center_x().round() as i32,
                list.center_y().round() as i32,
                notches,
            )?;
        }

        Err(AutomationError::ActionFailed(format!(
            "message not in view after {} scroll attempts",
            config.max_scroll_attempts
        )))
    }

    fn click_with_bias(
        &self,
        input: &dyn InputInjector,
        config: &ClassifierConfig,
        xbias: i32,
        click_type: ClickType,
    ) -> Result<(), AutomationError> {
        if self.is_system() {
            return Err(AutomationError::UnsupportedOperation(
                "system messages cannot be clicked".to_string(),
            ));
        }
        if !self.control.exists(Duration::ZERO) {
            return Err(stale());
        }
        let rect = self.control.bounding_rect()?;
        if !rect.is_usable() {
            return Err(stale());
        }
        let (x, y) = click_point(&rect, self.header.attr, xbias, config.message_ybias);
        debug!("{:?} click on {} at ({}, {})", click_type, self.summary(), x, y);
        input.click_at(x, y, click_type)
    }
}

/// Self bubbles are anchored to their right edge, others to the left edge.
/// The point is clamped into the rectangle.
pub(crate) fn click_point(rect: &Rect, attr: Attribution, xbias: i32, ybias: i32) -> (i32, i32) {
    let x = match attr {
        Attribution::SelfSent => rect.right - xbias,
        _ => rect.left + xbias,
    };
    let x = x.clamp(rect.left, rect.right - 1);
    let y = (rect.top + ybias).clamp(rect.top, rect.bottom - 1);
    (x, y)
}

fn stale() -> AutomationError {
    AutomationError::StaleControl("message control no longer exists".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_point_anchoring() {
        let rect = Rect::new(100, 200, 400, 260);
        assert_eq!(click_point(&rect, Attribution::SelfSent, 90, 30), (310, 230));
        assert_eq!(click_point(&rect, Attribution::Friend, 90, 30), (190, 230));
    }

    #[test]
    fn test_click_point_clamped_into_small_bubble() {
        let rect = Rect::new(100, 200, 130, 220);
        assert_eq!(click_point(&rect, Attribution::Friend, 90, 30), (129, 219));
        assert_eq!(click_point(&rect, Attribution::SelfSent, 90, 30), (100, 219));
    }
}
