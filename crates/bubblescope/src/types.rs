//! Common value types shared by the geometry, arbitration and message layers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen-space bounding rectangle of a control, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from an origin and a size, the way UIA reports bounds.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f64 {
        (self.left as f64 + self.right as f64) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.top as f64 + self.bottom as f64) / 2.0
    }

    /// A rectangle only counts as a geometry signal when it has positive extent.
    pub fn is_usable(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// True when `other` lies vertically inside this rectangle.
    pub fn contains_rows_of(&self, other: &Rect) -> bool {
        other.top >= self.top && other.bottom <= self.bottom
    }
}

/// Horizontal placement of a bubble inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Friend bubbles are left-aligned, own bubbles right-aligned.
    pub fn attribution(&self) -> Attribution {
        match self {
            Direction::Left => Attribution::Friend,
            Direction::Right => Attribution::SelfSent,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A direction estimate with a confidence in `[0, 1]`. `direction == None`
/// means the source could not decide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionSignal {
    pub direction: Option<Direction>,
    pub confidence: f64,
}

impl DirectionSignal {
    pub fn none() -> Self {
        Self {
            direction: None,
            confidence: 0.0,
        }
    }

    pub fn new(direction: Direction, confidence: f64) -> Self {
        Self {
            direction: Some(direction),
            confidence,
        }
    }

    pub fn is_none(&self) -> bool {
        self.direction.is_none()
    }
}

/// Output of the pixel detector: a side plus the raw pixel distance from
/// that edge. Smaller distances are more trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualSignal {
    pub direction: Direction,
    pub distance: f64,
}

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribution {
    #[serde(rename = "self")]
    SelfSent,
    #[serde(rename = "friend")]
    Friend,
    #[serde(rename = "system")]
    System,
}

impl Attribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribution::SelfSent => "self",
            Attribution::Friend => "friend",
            Attribution::System => "system",
        }
    }

    /// Prefix used by the namespaced message tags (`SelfTextMessage`, ...).
    pub fn tag_prefix(&self) -> &'static str {
        match self {
            Attribution::SelfSent => "Self",
            Attribution::Friend => "Friend",
            Attribution::System => "System",
        }
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque runtime identifier assigned by the accessibility layer. Not stable
/// across restarts of the host application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(pub Vec<i32>);

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        f.write_str(&parts.join("-"))
    }
}

/// Type of mouse click to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickType {
    Left,
    Double,
    Right,
}
