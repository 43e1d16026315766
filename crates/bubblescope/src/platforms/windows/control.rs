use crate::element::{Control, ControlImpl};
use crate::services::ControlSource;
use crate::types::{Rect, RuntimeId};
use crate::AutomationError;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;
use uiautomation::types::{Handle, TreeScope};
use uiautomation::{UIAutomation, UIElement};

const EXISTS_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// COM handles shared by all controls created from one [`UiaControlSource`].
struct UiaShared {
    automation: UIAutomation,
}

// UIA objects are created in the multithreaded apartment and only used from
// the thread that scans the chat.
unsafe impl Send for UiaShared {}
unsafe impl Sync for UiaShared {}

/// A UI Automation element.
#[derive(Clone)]
pub struct UiaControl {
    element: Arc<UIElement>,
    shared: Arc<UiaShared>,
}

unsafe impl Send for UiaControl {}
unsafe impl Sync for UiaControl {}

impl UiaControl {
    fn wrap(element: UIElement, shared: &Arc<UiaShared>) -> Control {
        Control::new(Self {
            element: Arc::new(element),
            shared: Arc::clone(shared),
        })
    }
}

impl fmt::Debug for UiaControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiaControl")
            .field("class_name", &self.element.get_classname().unwrap_or_default())
            .field("name", &self.element.get_name().unwrap_or_default())
            .finish()
    }
}

fn stale(what: &str, e: impl fmt::Display) -> AutomationError {
    AutomationError::StaleControl(format!("Failed to read {what}: {e}"))
}

impl ControlImpl for UiaControl {
    fn class_name(&self) -> Result<String, AutomationError> {
        self.element.get_classname().map_err(|e| stale("class name", e))
    }

    fn name(&self) -> Result<String, AutomationError> {
        self.element.get_name().map_err(|e| stale("name", e))
    }

    fn automation_id(&self) -> Result<String, AutomationError> {
        self.element
            .get_automation_id()
            .map_err(|e| stale("automation id", e))
    }

    fn control_type(&self) -> Result<String, AutomationError> {
        self.element
            .get_control_type()
            .map(|t| format!("{t:?}"))
            .map_err(|e| stale("control type", e))
    }

    fn runtime_id(&self) -> Result<RuntimeId, AutomationError> {
        self.element
            .get_runtime_id()
            .map(RuntimeId)
            .map_err(|e| stale("runtime id", e))
    }

    fn bounding_rect(&self) -> Result<Rect, AutomationError> {
        let r = self
            .element
            .get_bounding_rectangle()
            .map_err(|e| stale("bounding rectangle", e))?;
        Ok(Rect::new(r.get_left(), r.get_top(), r.get_right(), r.get_bottom()))
    }

    fn children(&self) -> Result<Vec<Control>, AutomationError> {
        let condition = self.shared.automation.create_true_condition().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to create true condition: {e}"))
        })?;
        let children = self
            .element
            .find_all(TreeScope::Children, &condition)
            .map_err(|e| stale("children", e))?;
        Ok(children
            .into_iter()
            .map(|child| Self::wrap(child, &self.shared))
            .collect())
    }

    fn exists(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.element.get_runtime_id().is_ok() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(EXISTS_POLL_INTERVAL);
        }
    }
}

/// Resolves native window handles through UI Automation.
#[derive(Clone)]
pub struct UiaControlSource {
    shared: Arc<UiaShared>,
}

impl UiaControlSource {
    pub fn new() -> Result<Self, AutomationError> {
        let automation = UIAutomation::new().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to initialize UI Automation: {e}"))
        })?;
        Ok(Self {
            shared: Arc::new(UiaShared { automation }),
        })
    }
}

impl ControlSource for UiaControlSource {
    fn control_from_handle(&self, hwnd: isize) -> Result<Control, AutomationError> {
        let element = self
            .shared
            .automation
            .element_from_handle(Handle::from(hwnd))
            .map_err(|e| {
                AutomationError::ElementNotFound(format!("No element for handle {hwnd:#x}: {e}"))
            })?;
        Ok(UiaControl::wrap(element, &self.shared))
    }

    fn find_windows(
        &self,
        class_name: &str,
        title: Option<&str>,
    ) -> Result<Vec<Control>, AutomationError> {
        let automation = &self.shared.automation;
        let root = automation.get_root_element().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get desktop root: {e}"))
        })?;

        let mut matcher = automation
            .create_matcher()
            .from(root)
            .depth(1)
            .classname(class_name)
            .timeout(0);
        if let Some(title) = title {
            matcher = matcher.name(title);
        }

        // The matcher reports "nothing found" as an error.
        let windows = matcher.find_all().unwrap_or_else(|e| {
            debug!("No '{}' windows found: {}", class_name, e);
            Vec::new()
        });
        Ok(windows
            .into_iter()
            .map(|element| UiaControl::wrap(element, &self.shared))
            .collect())
    }
}
