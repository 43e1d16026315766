//! Control handles and their read-only projections
//!
//! A [`Control`] is a cheap, clonable reference to a live accessibility element
//! owned by the platform layer. Every read may fail because the element can
//! vanish at any time. The classifier never sees a `Control` directly: it works
//! on a [`ControlView`], a snapshot of exactly the properties it needs.

use crate::config::UiClassNames;
use crate::types::{Rect, RuntimeId};
use crate::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Platform seam implemented by every accessibility backend.
pub trait ControlImpl: Send + Sync + fmt::Debug {
    fn class_name(&self) -> Result<String, AutomationError>;
    fn name(&self) -> Result<String, AutomationError>;
    fn automation_id(&self) -> Result<String, AutomationError>;
    fn control_type(&self) -> Result<String, AutomationError>;
    fn runtime_id(&self) -> Result<RuntimeId, AutomationError>;
    fn bounding_rect(&self) -> Result<Rect, AutomationError>;
    /// Direct children in tree order.
    fn children(&self) -> Result<Vec<Control>, AutomationError>;
    /// Whether the element still resolves, waiting up to `timeout`.
    fn exists(&self, timeout: Duration) -> bool;
}

/// Non-owning reference to a platform control.
#[derive(Clone)]
pub struct Control {
    inner: Arc<dyn ControlImpl>,
}

impl Control {
    pub fn new(inner: impl ControlImpl + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn from_arc(inner: Arc<dyn ControlImpl>) -> Self {
        Self { inner }
    }

    pub fn class_name(&self) -> Result<String, AutomationError> {
        self.inner.class_name()
    }

    pub fn name(&self) -> Result<String, AutomationError> {
        self.inner.name()
    }

    pub fn automation_id(&self) -> Result<String, AutomationError> {
        self.inner.automation_id()
    }

    pub fn control_type(&self) -> Result<String, AutomationError> {
        self.inner.control_type()
    }

    pub fn runtime_id(&self) -> Result<RuntimeId, AutomationError> {
        self.inner.runtime_id()
    }

    pub fn bounding_rect(&self) -> Result<Rect, AutomationError> {
        self.inner.bounding_rect()
    }

    pub fn children(&self) -> Result<Vec<Control>, AutomationError> {
        self.inner.children()
    }

    pub fn exists(&self, timeout: Duration) -> bool {
        self.inner.exists(timeout)
    }

    /// Live means the element resolves and still has vertical extent.
    pub fn is_live(&self) -> bool {
        self.exists(Duration::ZERO)
            && self
                .bounding_rect()
                .map(|rect| rect.height() > 0)
                .unwrap_or(false)
    }

    /// Both handles share one platform object.
    pub fn ptr_eq(&self, other: &Control) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the shared platform object, stable while any clone lives.
    pub fn ptr_addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Same underlying element, compared by runtime id.
    pub fn same_element(&self, other: &Control) -> bool {
        match (self.runtime_id(), other.runtime_id()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.ptr_eq(other),
        }
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// Snapshot of one child control, one level below the bubble.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildView {
    pub class_name: String,
    pub name: String,
}

/// Read-only projection of a message control, as consumed by the type cascade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlView {
    pub class_name: String,
    pub name: String,
    pub automation_id: String,
    pub rect: Option<Rect>,
    pub children: Vec<ChildView>,
}

impl ControlView {
    /// Read the projection from a live control. Failed reads degrade to empty
    /// values; children are enumerated only for classes that nest content.
    pub fn capture(control: &Control, class_names: &UiClassNames) -> Self {
        let class_name = read_or_default(control.class_name(), "class_name");
        let name = read_or_default(control.name(), "name");
        let automation_id = read_or_default(control.automation_id(), "automation_id");
        let rect = control.bounding_rect().ok();

        let children = if class_name == class_names.bubble_item {
            match control.children() {
                Ok(children) => children
                    .iter()
                    .map(|child| ChildView {
                        class_name: read_or_default(child.class_name(), "child class_name"),
                        name: read_or_default(child.name(), "child name"),
                    })
                    .collect(),
                Err(e) => {
                    debug!("Failed to enumerate bubble children: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self {
            class_name,
            name,
            automation_id,
            rect,
            children,
        }
    }

    pub fn has_automation_id(&self) -> bool {
        !self.automation_id.is_empty()
    }
}

fn read_or_default(value: Result<String, AutomationError>, what: &str) -> String {
    value.unwrap_or_else(|e| {
        debug!("Control read of {} failed: {}", what, e);
        String::new()
    })
}
