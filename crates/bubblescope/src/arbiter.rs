//! Direction resolution
//!
//! Combines the position signal (primary) with the pixel detector (secondary)
//! into one attribution. Geometry against the message container is trusted
//! most; screenshots only decide when the geometry cannot.

use crate::config::{ArbiterThresholds, ClassifierConfig};
use crate::element::{Control, ControlView};
use crate::position::PositionAnalyzer;
use crate::services::{PixelDirectionDetector, ScreenshotService};
use crate::types::{Attribution, Direction, DirectionSignal, VisualSignal};
use crate::AutomationError;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Final attribution of one control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub attr: Attribution,
    pub direction: Option<Direction>,
    pub distance: Option<f64>,
}

impl Resolution {
    pub fn system() -> Self {
        Self {
            attr: Attribution::System,
            direction: None,
            distance: None,
        }
    }
}

/// Which rule of the precedence chain decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    TrustedPosition,
    Agreement,
    StrongVisual,
    WeakPosition,
    PlausibleVisual,
    LastResort,
}

/// Apply the precedence chain to already computed signals.
///
/// `visual` is evaluated lazily: it is only called when the position signal
/// alone is not trusted. `None` from it means no visual signal could be
/// produced.
pub fn arbitrate(
    position: DirectionSignal,
    visual: impl FnOnce() -> Option<VisualSignal>,
    thresholds: &ArbiterThresholds,
) -> (Direction, f64, Rule) {
    let conf = position.confidence;

    if let Some(direction) = position.direction {
        if conf > thresholds.position_trust {
            return (direction, conf * 1000.0, Rule::TrustedPosition);
        }
    }

    let visual = visual();
    let (visual_direction, visual_distance) = match visual {
        Some(signal) => (Some(signal.direction), signal.distance),
        None => (None, f64::INFINITY),
    };

    if let Some(direction) = position.direction {
        if Some(direction) == visual_direction {
            let score = if conf > 0.0 {
                conf * 1000.0
            } else {
                visual_distance
            };
            return (direction, score, Rule::Agreement);
        }
    }

    if let Some(direction) = visual_direction {
        if visual_distance < thresholds.visual_strong_px {
            return (direction, visual_distance, Rule::StrongVisual);
        }
    }

    if let Some(direction) = position.direction {
        let score = if conf > 0.0 {
            conf * 1000.0
        } else {
            thresholds.weak_position_score
        };
        return (direction, score, Rule::WeakPosition);
    }

    if let Some(direction) = visual_direction {
        if visual_distance < thresholds.visual_plausible_px {
            return (direction, visual_distance, Rule::PlausibleVisual);
        }
        return (direction, visual_distance, Rule::LastResort);
    }

    (
        thresholds.last_resort_direction,
        thresholds.weak_position_score,
        Rule::LastResort,
    )
}

/// Resolves the sender of message controls against their container.
pub struct DirectionArbiter<'a> {
    config: &'a ClassifierConfig,
    screenshots: &'a dyn ScreenshotService,
    detector: &'a dyn PixelDirectionDetector,
}

impl<'a> DirectionArbiter<'a> {
    pub fn new(
        config: &'a ClassifierConfig,
        screenshots: &'a dyn ScreenshotService,
        detector: &'a dyn PixelDirectionDetector,
    ) -> Self {
        Self {
            config,
            screenshots,
            detector,
        }
    }

    /// Attribution for `control`. Controls without an automation id are
    /// system notices and are never positioned.
    #[instrument(level = "debug", skip(self, control, container, siblings, view), fields(class = %view.class_name))]
    pub fn resolve(
        &self,
        control: &Control,
        container: &Control,
        siblings: Option<&[Control]>,
        view: &ControlView,
    ) -> Resolution {
        if !view.has_automation_id() {
            return Resolution::system();
        }

        let analyzer = PositionAnalyzer::new(&self.config.class_names, &self.config.geometry);
        let position = analyzer.analyze(control, container, siblings);

        let (direction, distance, rule) =
            arbitrate(position, || self.visual_signal(control), &self.config.arbiter);

        debug!(
            "Resolved {} (score {:.1}) by {:?}; position={:?}",
            direction, distance, rule, position
        );

        Resolution {
            attr: direction.attribution(),
            direction: Some(direction),
            distance: Some(distance),
        }
    }

    /// Screenshot the control and run the pixel detector. The temporary file
    /// is removed when `captured` goes out of scope, on every path.
    fn visual_signal(&self, control: &Control) -> Option<VisualSignal> {
        match self.capture_and_detect(control) {
            Ok(signal) => Some(signal),
            Err(e) if e.is_stale() => {
                debug!("Control vanished before visual check: {}", e);
                None
            }
            Err(e) => {
                warn!("Visual direction check failed: {}", e);
                None
            }
        }
    }

    fn capture_and_detect(&self, control: &Control) -> Result<VisualSignal, AutomationError> {
        let rect = control.bounding_rect()?;
        if !rect.is_usable() {
            return Err(AutomationError::StaleControl(
                "control has no visible area to capture".to_string(),
            ));
        }
        let captured = self.screenshots.capture_region(rect)?;
        self.detector.detect(captured.path())
    }
}
