// THEORY:
// This file is the main entry point for the `hue_tracker` library crate.
//
// The public face of the crate is the `TrackingPipeline` (one frame in, one
// annotated frame plus its HSV image, mask and verdict out) and the capture
// loop in `capture` that feeds it from a camera and shows the results. The
// individual stages live in `core_modules` and can be used on their own.

pub mod capture;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use pipeline::{FrameAnalysis, Selection, Target, TrackingPipeline};
