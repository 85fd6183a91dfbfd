// THEORY:
// Every tunable the tracker reads lives in `TrackerConfig`. A default config
// reproduces the classic setup: a 640x480 frame, a 400 px² minimum object, a
// 50-contour noise limit, erode 3x3 twice then dilate 8x8 twice.
//
// The config can be read from a JSON file; missing fields fall back to the
// defaults, so a file only needs to name what it changes.

use crate::core_modules::hsv_range::HsvRange;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the `TrackingPipeline` and the capture loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Contours must be strictly larger than this to count as an object.
    pub min_object_area: f64,
    /// Exclusive upper bound on object area. `None` means two thirds of the frame.
    pub max_object_area: Option<f64>,
    /// At or above this many contours the frame is treated as noise.
    pub max_num_objects: usize,
    pub use_morph_ops: bool,
    pub track_objects: bool,
    pub erode_kernel: u32,
    pub erode_iterations: u32,
    pub dilate_kernel: u32,
    pub dilate_iterations: u32,
    pub frame_delay_ms: u64,
    pub max_consecutive_capture_failures: u32,
    pub initial_range: HsvRange,
    pub font_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            min_object_area: 20.0 * 20.0,
            max_object_area: None,
            max_num_objects: 50,
            use_morph_ops: true,
            track_objects: true,
            erode_kernel: 3,
            erode_iterations: 2,
            dilate_kernel: 8,
            dilate_iterations: 2,
            frame_delay_ms: 30,
            max_consecutive_capture_failures: 30,
            initial_range: HsvRange::default(),
            font_path: None,
        }
    }
}

impl TrackerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        log::info!("loaded tracker config from {}", path.display());
        Ok(config)
    }

    pub fn effective_max_object_area(&self) -> f64 {
        self.max_object_area
            .unwrap_or(self.frame_width as f64 * self.frame_height as f64 / 1.5)
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }
}
