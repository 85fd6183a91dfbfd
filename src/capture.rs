// THEORY:
// The capture loop is the outer shell of the tracker. Each tick it:
//   1. takes a fresh snapshot of the shared `HsvRange`,
//   2. reads one frame from a `FrameSource`,
//   3. runs the `TrackingPipeline` on it,
//   4. hands the three surfaces (annotated original, HSV, mask) to a `FrameSink`,
//   5. waits `frame_delay_ms` before the next tick.
//
// Steps 1-3 are the lazy `AnnotatedFrames` iterator; steps 4-5 are the async
// `run` driver, which also watches a shutdown signal.
//
// Failure policy: a frame that cannot be read, or arrives with the wrong size,
// costs only its own tick. The iterator yields the error and keeps going. Once
// `max_consecutive_capture_failures` reads in a row have failed, it yields a
// single `CaptureExhausted` and ends. Any good frame resets the count.

use crate::core_modules::color_filter::Mask;
use crate::core_modules::color_space::HsvImage;
use crate::core_modules::hsv_range::RangeView;
use crate::core_modules::object_selector::Selection;
use crate::error::{Result, TrackerError};
use crate::pipeline::TrackingPipeline;
use image::RgbImage;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Anything that produces camera frames.
pub trait FrameSource {
    /// `Ok(None)` means the source has ended for good.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Anything that shows the three output surfaces.
pub trait FrameSink {
    fn present(&mut self, frame: &AnnotatedFrame) -> Result<()>;
}

/// Everything produced for one successfully processed frame.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    /// Zero-based count of successfully processed frames.
    pub index: u64,
    pub original: RgbImage,
    pub hsv: HsvImage,
    pub mask: Mask,
    pub selection: Selection,
}

/// Lazy stream of processed frames.
pub struct AnnotatedFrames<S> {
    source: S,
    pipeline: TrackingPipeline,
    range: RangeView,
    index: u64,
    consecutive_failures: u32,
    finished: bool,
}

impl<S: FrameSource> AnnotatedFrames<S> {
    pub fn new(source: S, pipeline: TrackingPipeline, range: RangeView) -> Self {
        Self {
            source,
            pipeline,
            range,
            index: 0,
            consecutive_failures: 0,
            finished: false,
        }
    }

    pub fn pipeline(&self) -> &TrackingPipeline {
        &self.pipeline
    }

    fn tick(&mut self) -> Result<Option<AnnotatedFrame>> {
        let range = self.range.snapshot();
        let Some(frame) = self.source.read_frame()? else {
            return Ok(None);
        };
        let (original, analysis) = self.pipeline.process(frame, &range)?;
        let frame = AnnotatedFrame {
            index: self.index,
            original,
            hsv: analysis.hsv,
            mask: analysis.mask,
            selection: analysis.selection,
        };
        self.index += 1;
        Ok(Some(frame))
    }

    fn failed(&mut self, error: TrackerError) -> TrackerError {
        if !error.is_recoverable() {
            self.finished = true;
            return error;
        }
        self.consecutive_failures += 1;
        let limit = self.pipeline.config().max_consecutive_capture_failures;
        log::warn!("{error} ({}/{limit} consecutive)", self.consecutive_failures);
        if self.consecutive_failures >= limit {
            self.finished = true;
            return TrackerError::CaptureExhausted {
                attempts: self.consecutive_failures,
            };
        }
        error
    }
}

impl<S: FrameSource> Iterator for AnnotatedFrames<S> {
    type Item = Result<AnnotatedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.tick() {
            Ok(Some(frame)) => {
                self.consecutive_failures = 0;
                Some(Ok(frame))
            }
            Ok(None) => {
                log::info!("frame source ended after {} frames", self.index);
                self.finished = true;
                None
            }
            Err(e) => Some(Err(self.failed(e))),
        }
    }
}

impl<S: FrameSource> FusedIterator for AnnotatedFrames<S> {}

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SourceEnded,
    Shutdown,
    CaptureExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_presented: u64,
    pub capture_failures: u64,
    pub frames_tracked: u64,
    pub stop: StopReason,
}

/// Drives `frames` into `sink` until the source ends, capture is exhausted, or
/// `shutdown` becomes true. Sink errors and unrecoverable source errors are returned.
pub async fn run<S, K>(
    mut frames: AnnotatedFrames<S>,
    sink: &mut K,
    mut shutdown: watch::Receiver<bool>,
) -> Result<RunSummary>
where
    S: FrameSource,
    K: FrameSink + ?Sized,
{
    let delay = frames.pipeline().config().frame_delay();
    let mut frames_presented = 0;
    let mut capture_failures = 0;
    let mut frames_tracked = 0;

    let stop = loop {
        if *shutdown.borrow_and_update() {
            break StopReason::Shutdown;
        }

        match frames.next() {
            None => break StopReason::SourceEnded,
            Some(Ok(frame)) => {
                sink.present(&frame)?;
                frames_presented += 1;
                if frame.selection.is_found() {
                    frames_tracked += 1;
                }
            }
            Some(Err(TrackerError::CaptureExhausted { attempts })) => {
                capture_failures += 1;
                log::error!("giving up after {attempts} failed captures");
                break StopReason::CaptureExhausted;
            }
            Some(Err(e)) if e.is_recoverable() => capture_failures += 1,
            Some(Err(e)) => return Err(e),
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown.changed() => {
                // Nobody left to signal shutdown; keep the pacing.
                if changed.is_err() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    };

    let summary = RunSummary {
        frames_presented,
        capture_failures,
        frames_tracked,
        stop,
    };
    log::info!("capture loop stopped: {summary:?}");
    Ok(summary)
}

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tif"];

/// Replays the image files of a directory, in file name order.
pub struct ImageDirectorySource {
    paths: Vec<PathBuf>,
    position: usize,
    repeat: bool,
}

impl ImageDirectorySource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();
        log::info!("{} frames found in {}", paths.len(), dir.display());
        Ok(Self {
            paths,
            position: 0,
            repeat: false,
        })
    }

    /// Start over from the first file instead of ending.
    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageDirectorySource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.position >= self.paths.len() {
            if !self.repeat || self.paths.is_empty() {
                return Ok(None);
            }
            self.position = 0;
        }
        let path = &self.paths[self.position];
        self.position += 1;
        match image::open(path) {
            Ok(image) => Ok(Some(image.to_rgb8())),
            Err(e) => Err(TrackerError::Capture(format!("{}: {e}", path.display()))),
        }
    }
}

/// Writes the three surfaces of every frame as PNG files.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path(&self, surface: &str, index: u64) -> PathBuf {
        self.dir.join(format!("{surface}_{index:05}.png"))
    }
}

impl FrameSink for DirectorySink {
    fn present(&mut self, frame: &AnnotatedFrame) -> Result<()> {
        frame.original.save(self.path("original", frame.index))?;
        frame.hsv.save(self.path("hsv", frame.index))?;
        frame.mask.save(self.path("threshold", frame.index))?;
        match frame.selection {
            Selection::Tracking(target) => {
                log::info!("frame {}: object at ({}, {})", frame.index, target.x, target.y)
            }
            Selection::TooMuchNoise { contour_count } => {
                log::info!("frame {}: too much noise ({contour_count} contours)", frame.index)
            }
            Selection::NotFound { .. } => log::debug!("frame {}: nothing found", frame.index),
        }
        Ok(())
    }
}
