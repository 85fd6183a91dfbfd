// THEORY:
// The `ObjectSelector` is the decision layer of the tracker. Given every
// contour found in a frame, it picks at most one object and reports where it
// is. It is stateless: nothing survives from one frame to the next.
//
// The algorithm, in order:
// 1.  **Noise guard**: a mask that shatters into `max_num_objects` or more
//     contours means the colour filter is badly tuned. Selection is skipped and
//     the frame is reported as `TooMuchNoise`.
// 2.  **Top-level walk**: only contour 0 and its chain of `next` siblings are
//     considered, bottom of the frame first. Holes are never candidates.
// 3.  **Area gate**: a contour is accepted when
//     `min_object_area < area < max_object_area` *and* its area beats the
//     largest area accepted so far in this walk. Acceptance records the
//     centroid and raises the reference area.
// 4.  **Flag reset**: any contour that fails the gate clears the "found" flag
//     but does not forget the recorded centroid or reference area. Only the
//     flag as it stands after the last visited contour decides the outcome.
//     A valid object followed by a rejected contour is therefore reported as
//     `NotFound`, with the forgotten candidate kept in `suppressed` so callers
//     can see what happened.

use crate::config::TrackerConfig;
use crate::core_modules::contour::ContourSet;
use crate::core_modules::moment::Moments;

/// A located object: integer pixel centroid (truncated toward zero) and its area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub x: i32,
    pub y: i32,
    pub area: f64,
}

/// What the selector concluded about one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// An object was found; annotate it.
    Tracking(Target),
    /// Nothing to annotate. `suppressed` holds the best candidate recorded
    /// during the walk when a later contour reset the flag.
    NotFound { suppressed: Option<Target> },
    /// The mask had too many contours to be trusted.
    TooMuchNoise { contour_count: usize },
}

impl Selection {
    pub fn target(&self) -> Option<Target> {
        match self {
            Selection::Tracking(target) => Some(*target),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Selection::Tracking(_))
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, Selection::TooMuchNoise { .. })
    }
}

/// Area bounds and the noise limit for object selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectSelector {
    pub min_object_area: f64,
    pub max_object_area: f64,
    pub max_num_objects: usize,
}

impl Default for ObjectSelector {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl ObjectSelector {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            min_object_area: config.min_object_area,
            max_object_area: config.effective_max_object_area(),
            max_num_objects: config.max_num_objects,
        }
    }

    pub fn select(&self, contours: &ContourSet) -> Selection {
        if contours.is_empty() {
            return Selection::NotFound { suppressed: None };
        }
        if contours.len() >= self.max_num_objects {
            log::debug!("{} contours, filter too noisy", contours.len());
            return Selection::TooMuchNoise {
                contour_count: contours.len(),
            };
        }

        let mut reference_area = 0.0;
        let mut object_found = false;
        let mut recorded: Option<Target> = None;

        for (index, contour) in contours.top_level() {
            let moments = Moments::of_polygon(&contour.points);
            let area = moments.area();
            let in_bounds = area > self.min_object_area && area < self.max_object_area;

            match moments.centroid() {
                Some((cx, cy)) if in_bounds && area > reference_area => {
                    recorded = Some(Target {
                        x: cx as i32,
                        y: cy as i32,
                        area,
                    });
                    reference_area = area;
                    object_found = true;
                    log::debug!("contour {index}: accepted, area {area:.1} at ({cx:.1}, {cy:.1})");
                }
                _ => {
                    object_found = false;
                    log::debug!("contour {index}: rejected, area {area:.1}");
                }
            }
        }

        match recorded {
            Some(target) if object_found => Selection::Tracking(target),
            suppressed => Selection::NotFound { suppressed },
        }
    }
}
