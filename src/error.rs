// THEORY:
// A single error type for everything that can go wrong *outside* the vision
// math. The per-frame outcomes of the tracker ("too much noise", "nothing
// found") are not errors; they live in `Selection`. What ends up here is the
// boundary with the outside world: the camera, the display, fonts, and files.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// One frame could not be read. The loop skips rendering for the tick.
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// The bounded retry budget for consecutive capture failures is spent.
    #[error("frame source failed {attempts} consecutive times, giving up")]
    CaptureExhausted { attempts: u32 },

    #[error("frame is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("display error: {0}")]
    Display(String),

    #[error("font {path:?} could not be loaded: {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackerError {
    /// Errors that only cost the current tick; the capture loop keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::Capture(_) | TrackerError::FrameSize { .. } | TrackerError::BufferSize { .. }
        )
    }
}
