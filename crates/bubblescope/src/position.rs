//! Geometry/position analysis
//!
//! Estimates which side of the message container a bubble occupies from
//! bounding rectangles alone. The pure functions work on plain rectangles;
//! [`PositionAnalyzer`] feeds them from live controls.

use crate::config::{GeometryThresholds, UiClassNames};
use crate::element::Control;
use crate::types::{Direction, DirectionSignal, Rect};
use tracing::debug;

/// Class name and bounds of a child control considered as the real bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildGeometry {
    pub class_name: String,
    pub rect: Option<Rect>,
}

/// A control this close to the container's width is a row wrapper.
pub fn is_wrapper(control: &Rect, container: &Rect, thresholds: &GeometryThresholds) -> bool {
    (control.width() - container.width()).abs() <= thresholds.wrapper_tolerance_px
}

/// Direction from the bubble's centre offset against the container's centre.
pub fn signal_from_rects(
    bubble: &Rect,
    container: &Rect,
    thresholds: &GeometryThresholds,
) -> DirectionSignal {
    let container_width = container.width() as f64;
    if container_width <= 0.0 {
        return DirectionSignal::none();
    }

    let offset = bubble.center_x() - container.center_x();
    let ratio = offset / (container_width / 2.0);

    if ratio < -thresholds.center_dead_zone {
        DirectionSignal::new(Direction::Left, ratio.abs().min(1.0))
    } else if ratio > thresholds.center_dead_zone {
        DirectionSignal::new(Direction::Right, ratio.abs().min(1.0))
    } else if offset < 0.0 {
        DirectionSignal::new(Direction::Left, thresholds.near_center_confidence)
    } else if offset > 0.0 {
        DirectionSignal::new(Direction::Right, thresholds.near_center_confidence)
    } else {
        DirectionSignal::none()
    }
}

/// Pick the widest bubble-class child that is still clearly narrower than the
/// container.
pub fn pick_bubble_child(
    children: &[ChildGeometry],
    container_width: i32,
    class_names: &UiClassNames,
    thresholds: &GeometryThresholds,
) -> Option<Rect> {
    let limit = container_width as f64 * thresholds.bubble_max_width_ratio;
    children
        .iter()
        .filter(|child| class_names.is_bubble_class(&child.class_name))
        .filter_map(|child| child.rect)
        .filter(|rect| rect.width() > 0 && (rect.width() as f64) < limit)
        .fold(None, |best: Option<Rect>, rect| match best {
            Some(current) if current.width() >= rect.width() => Some(current),
            _ => Some(rect),
        })
}

/// Direction from the average offset of the neighbors around `index`.
///
/// `rects` is the full ordered message list; entries outside the sampling
/// window are ignored, `None` entries could not be read.
pub fn neighbor_signal(
    index: usize,
    rects: &[Option<Rect>],
    container: &Rect,
    thresholds: &GeometryThresholds,
) -> DirectionSignal {
    let container_width = container.width() as f64;
    if rects.len() < 2 || index >= rects.len() || container_width <= 0.0 {
        return DirectionSignal::none();
    }

    let (start, end) = sampling_window(index, rects.len(), thresholds.neighbor_window);
    let offsets: Vec<f64> = (start..end)
        .filter(|&i| i != index)
        .filter_map(|i| rects[i])
        .filter(|rect| !is_wrapper(rect, container, thresholds))
        .map(|rect| rect.center_x() - container.center_x())
        .collect();

    if offsets.is_empty() {
        return DirectionSignal::none();
    }

    let average = offsets.iter().sum::<f64>() / offsets.len() as f64;
    let confidence = (average.abs() / container_width).min(1.0);
    if average > thresholds.neighbor_min_offset_px {
        DirectionSignal::new(Direction::Right, confidence)
    } else if average < -thresholds.neighbor_min_offset_px {
        DirectionSignal::new(Direction::Left, confidence)
    } else {
        DirectionSignal::none()
    }
}

/// Half-open index range of a window of `size` entries centred on `index`.
fn sampling_window(index: usize, len: usize, size: usize) -> (usize, usize) {
    let sample = size.min(len);
    let half = sample / 2;
    (index.saturating_sub(half), (index + half + 1).min(len))
}

/// Runs the position analysis against live controls.
pub struct PositionAnalyzer<'a> {
    class_names: &'a UiClassNames,
    thresholds: &'a GeometryThresholds,
}

impl<'a> PositionAnalyzer<'a> {
    pub fn new(class_names: &'a UiClassNames, thresholds: &'a GeometryThresholds) -> Self {
        Self {
            class_names,
            thresholds,
        }
    }

    /// Position signal for `control` inside `container`, falling back to the
    /// neighbors in the container's child list when the control's own
    /// rectangle is not a bubble.
    ///
    /// `siblings` is the container's child list when the caller already has
    /// it; otherwise the fallback enumerates the container itself.
    pub fn analyze(
        &self,
        control: &Control,
        container: &Control,
        siblings: Option<&[Control]>,
    ) -> DirectionSignal {
        let container_rect = match container.bounding_rect() {
            Ok(rect) if rect.width() > 0 => rect,
            Ok(_) => return DirectionSignal::none(),
            Err(e) => {
                debug!("Container bounds unavailable: {}", e);
                return DirectionSignal::none();
            }
        };

        let control_rect = match control.bounding_rect() {
            Ok(rect) => rect,
            Err(e) => {
                debug!("Control bounds unavailable: {}", e);
                return DirectionSignal::none();
            }
        };

        if !control_rect.is_usable() {
            debug!("Control rectangle {:?} unusable, sampling neighbors", control_rect);
            return self.neighbors_of(control, container, siblings, &container_rect);
        }

        let bubble_rect = if is_wrapper(&control_rect, &container_rect, self.thresholds) {
            match self.bubble_child_rect(control, &container_rect) {
                Some(rect) => rect,
                None => {
                    debug!("No bubble child inside wrapper, sampling neighbors");
                    return self.neighbors_of(control, container, siblings, &container_rect);
                }
            }
        } else {
            control_rect
        };

        signal_from_rects(&bubble_rect, &container_rect, self.thresholds)
    }

    /// Index-based fallback over an already enumerated, ordered message list.
    pub fn analyze_by_neighbors(
        &self,
        control: &Control,
        container_rect: &Rect,
        all_controls: &[Control],
    ) -> DirectionSignal {
        if all_controls.len() < 2 {
            return DirectionSignal::none();
        }
        let Some(index) = all_controls.iter().position(|c| c.same_element(control)) else {
            debug!("Control not found among {} siblings", all_controls.len());
            return DirectionSignal::none();
        };

        let (start, end) = sampling_window(index, all_controls.len(), self.thresholds.neighbor_window);
        let rects: Vec<Option<Rect>> = all_controls
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i >= start && i < end && i != index {
                    c.bounding_rect().ok()
                } else {
                    None
                }
            })
            .collect();

        neighbor_signal(index, &rects, container_rect, self.thresholds)
    }

    fn neighbors_of(
        &self,
        control: &Control,
        container: &Control,
        siblings: Option<&[Control]>,
        container_rect: &Rect,
    ) -> DirectionSignal {
        if let Some(all) = siblings {
            return self.analyze_by_neighbors(control, container_rect, all);
        }
        match container.children() {
            Ok(all) => self.analyze_by_neighbors(control, container_rect, &all),
            Err(e) => {
                debug!("Failed to enumerate message list: {}", e);
                DirectionSignal::none()
            }
        }
    }

    fn bubble_child_rect(&self, control: &Control, container_rect: &Rect) -> Option<Rect> {
        let children = match control.children() {
            Ok(children) => children,
            Err(e) => {
                debug!("Failed to enumerate wrapper children: {}", e);
                return None;
            }
        };
        let geometry: Vec<ChildGeometry> = children
            .iter()
            .map(|child| ChildGeometry {
                class_name: child.class_name().unwrap_or_default(),
                rect: child.bounding_rect().ok(),
            })
            .collect();
        pick_bubble_child(
            &geometry,
            container_rect.width(),
            self.class_names,
            self.thresholds,
        )
    }
}
