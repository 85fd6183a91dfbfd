// Live tracker: reads a camera through OpenCV, shows the annotated feed, the
// HSV image and the threshold mask in three windows, and exposes the six HSV
// bounds as trackbars.

use clap::Parser;
use hue_tracker::capture::{self, AnnotatedFrame, AnnotatedFrames, FrameSink, FrameSource};
use hue_tracker::core_modules::color_space::{bgr_bytes, rgb_from_bgr};
use hue_tracker::core_modules::hsv_range::{RangeBound, RangeHandle, SLIDER_MAX};
use hue_tracker::{TrackerConfig, TrackerError, TrackingPipeline};
use image::RgbImage;
use opencv::{
    core::{self, Mat, Scalar},
    highgui,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::PathBuf;
use tokio::sync::watch;

const ORIGINAL_WINDOW: &str = "Original Image";
const HSV_WINDOW: &str = "HSV Image";
const THRESHOLD_WINDOW: &str = "Threshold Image";
const TRACKBAR_WINDOW: &str = "Trackbars";
const ESC_KEY: i32 = 27;

#[derive(Parser, Debug)]
#[command(about = "Track one coloured object from a live camera")]
struct Args {
    /// Camera index passed to OpenCV.
    #[arg(long, default_value_t = 0)]
    camera: i32,
    /// JSON tracker config.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// TTF/OTF font for on-frame text.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Skip the erode/dilate cleanup.
    #[arg(long)]
    no_morph: bool,
}

struct CameraSource {
    capture: VideoCapture,
    frame: Mat,
}

impl CameraSource {
    fn open(index: i32, width: u32, height: u32) -> opencv::Result<Self> {
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        Ok(Self {
            capture,
            frame: Mat::default(),
        })
    }

    fn is_opened(&self) -> opencv::Result<bool> {
        self.capture.is_opened()
    }

    /// The resolution the driver actually granted.
    fn resolution(&self) -> opencv::Result<(u32, u32)> {
        let width = self.capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = self.capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        Ok((width, height))
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> hue_tracker::Result<Option<RgbImage>> {
        let grabbed = self
            .capture
            .read(&mut self.frame)
            .map_err(|e| TrackerError::Capture(e.to_string()))?;
        if !grabbed || self.frame.empty() {
            return Err(TrackerError::Capture("camera returned no frame".into()));
        }
        let bytes = self
            .frame
            .data_bytes()
            .map_err(|e| TrackerError::Capture(e.to_string()))?;
        let frame = rgb_from_bgr(self.frame.cols() as u32, self.frame.rows() as u32, bytes)?;
        Ok(Some(frame))
    }
}

/// Shows each surface in its own window and turns ESC into a shutdown request.
struct WindowSink {
    shutdown: watch::Sender<bool>,
}

impl WindowSink {
    fn show(window: &str, width: u32, height: u32, kind: i32, bytes: &[u8]) -> opencv::Result<()> {
        let mut mat = Mat::new_rows_cols_with_default(height as i32, width as i32, kind, Scalar::all(0.0))?;
        mat.data_bytes_mut()?.copy_from_slice(bytes);
        highgui::imshow(window, &mat)
    }

    fn present_frame(&mut self, frame: &AnnotatedFrame) -> opencv::Result<()> {
        let (width, height) = frame.original.dimensions();
        Self::show(ORIGINAL_WINDOW, width, height, core::CV_8UC3, &bgr_bytes(&frame.original))?;
        // The HSV channels go to the window unconverted, as false colour.
        Self::show(HSV_WINDOW, width, height, core::CV_8UC3, frame.hsv.as_raw())?;
        Self::show(THRESHOLD_WINDOW, width, height, core::CV_8UC1, frame.mask.as_raw())?;

        if highgui::wait_key(1)? == ESC_KEY {
            log::info!("ESC pressed, stopping");
            self.shutdown.send_replace(true);
        }
        Ok(())
    }
}

impl FrameSink for WindowSink {
    fn present(&mut self, frame: &AnnotatedFrame) -> hue_tracker::Result<()> {
        self.present_frame(frame)
            .map_err(|e| TrackerError::Display(e.to_string()))
    }
}

fn create_trackbars(range: &RangeHandle) -> opencv::Result<()> {
    highgui::named_window(TRACKBAR_WINDOW, highgui::WINDOW_AUTOSIZE)?;
    let initial = range.current();
    for bound in RangeBound::ALL {
        let handle = range.clone();
        highgui::create_trackbar(
            bound.name(),
            TRACKBAR_WINDOW,
            None,
            SLIDER_MAX as i32,
            Some(Box::new(move |position| handle.set(bound, position))),
        )?;
        highgui::set_trackbar_pos(bound.name(), TRACKBAR_WINDOW, initial.get(bound) as i32)?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrackerConfig::from_json_file(path)?,
        None => TrackerConfig::default(),
    };
    config.frame_width = args.width.unwrap_or(config.frame_width);
    config.frame_height = args.height.unwrap_or(config.frame_height);
    config.use_morph_ops &= !args.no_morph;
    if args.font.is_some() {
        config.font_path = args.font.clone();
    }

    let camera = CameraSource::open(args.camera, config.frame_width, config.frame_height)?;
    if !camera.is_opened()? {
        anyhow::bail!("camera {} could not be opened", args.camera);
    }
    let (width, height) = camera.resolution()?;
    if (width, height) != (config.frame_width, config.frame_height) {
        log::warn!(
            "camera delivers {width}x{height}, not {}x{}",
            config.frame_width,
            config.frame_height
        );
        config.frame_width = width;
        config.frame_height = height;
    }

    for window in [ORIGINAL_WINDOW, HSV_WINDOW, THRESHOLD_WINDOW] {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
    }
    let range = RangeHandle::new(config.initial_range);
    create_trackbars(&range)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut sink = WindowSink {
        shutdown: shutdown_tx,
    };
    let frames = AnnotatedFrames::new(camera, TrackingPipeline::new(config), range.view());

    let summary = capture::run(frames, &mut sink, shutdown_rx).await?;
    log::info!(
        "{} frames shown, {} with a tracked object, {} capture failures",
        summary.frames_presented,
        summary.frames_tracked,
        summary.capture_failures
    );
    highgui::destroy_all_windows()?;
    Ok(())
}
