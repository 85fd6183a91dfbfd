// THEORY:
// The `pipeline` module is the top-level API of the tracker. One call takes a
// camera frame and the current `HsvRange` and runs the full chain:
//
//   RGB frame -> HSV -> colour mask -> morphology -> contours -> selection
//
// and finally draws the outcome onto the frame itself. The pipeline holds no
// per-frame state; the only thing that changes between frames is the range
// the caller passes in.

use crate::config::TrackerConfig;
use crate::core_modules::annotator::{load_font, Annotator, ImageSurface};
use crate::core_modules::color_filter::{color_filter, Mask};
use crate::core_modules::color_space::{hsv_from_rgb, HsvImage};
use crate::core_modules::contour::ContourSet;
use crate::core_modules::hsv_range::HsvRange;
use crate::core_modules::morphology::MorphologyCleaner;
use crate::core_modules::object_selector::ObjectSelector;
use crate::error::{Result, TrackerError};
use ab_glyph::FontArc;
use image::RgbImage;

// Re-export key data structures for the public API.
pub use crate::core_modules::object_selector::{Selection, Target};

/// The intermediate surfaces and the verdict for one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub hsv: HsvImage,
    /// The thresholded mask after morphology, as shown to the user.
    pub mask: Mask,
    pub selection: Selection,
}

/// The main, top-level struct for the tracker.
pub struct TrackingPipeline {
    config: TrackerConfig,
    cleaner: MorphologyCleaner,
    selector: ObjectSelector,
    annotator: Annotator,
    font: Option<FontArc>,
}

impl TrackingPipeline {
    /// Builds a pipeline. A font that fails to load is logged and text is skipped.
    pub fn new(config: TrackerConfig) -> Self {
        let font = config.font_path.as_deref().and_then(|path| match load_font(path) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("{e}; on-frame text disabled");
                None
            }
        });
        Self {
            cleaner: MorphologyCleaner::from_config(&config),
            selector: ObjectSelector::from_config(&config),
            annotator: Annotator::default(),
            config,
            font,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Runs every stage except drawing.
    pub fn analyze(&self, frame: &RgbImage, range: &HsvRange) -> Result<FrameAnalysis> {
        let (width, height) = frame.dimensions();
        if (width, height) != (self.config.frame_width, self.config.frame_height) {
            return Err(TrackerError::FrameSize {
                expected_width: self.config.frame_width,
                expected_height: self.config.frame_height,
                actual_width: width,
                actual_height: height,
            });
        }

        // Stage 1: colour space
        let hsv = hsv_from_rgb(frame);

        // Stage 2: threshold
        let raw_mask = color_filter::in_range(&hsv, range);

        // Stage 3: morphology
        let mask = self.cleaner.clean(&raw_mask);
        log::trace!(
            "mask coverage {} -> {} px",
            color_filter::coverage(&raw_mask),
            color_filter::coverage(&mask)
        );

        // Stage 4: contours and selection
        let selection = if self.config.track_objects {
            self.selector.select(&ContourSet::extract(&mask))
        } else {
            Selection::NotFound { suppressed: None }
        };

        Ok(FrameAnalysis { hsv, mask, selection })
    }

    /// Draws `selection` onto `frame`.
    pub fn annotate(&self, frame: &mut RgbImage, selection: &Selection) {
        let mut surface = ImageSurface::new(frame, self.font.as_ref());
        self.annotator.annotate(&mut surface, selection);
    }

    /// Analyzes `frame` and returns it annotated alongside the analysis.
    pub fn process(&self, mut frame: RgbImage, range: &HsvRange) -> Result<(RgbImage, FrameAnalysis)> {
        let analysis = self.analyze(&frame, range)?;
        self.annotate(&mut frame, &analysis.selection);
        Ok((frame, analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_filter::MASK_ON;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    fn red_range() -> HsvRange {
        HsvRange::new([0, 100, 100], [10, 256, 256])
    }

    fn frame_with_square(x: i32, y: i32, side: u32) -> RgbImage {
        let mut frame = RgbImage::new(640, 480);
        draw_filled_rect_mut(&mut frame, Rect::at(x, y).of_size(side, side), RED);
        frame
    }

    #[test]
    fn red_square_is_tracked_near_its_centre() {
        let pipeline = TrackingPipeline::new(TrackerConfig::default());
        let frame = frame_with_square(100, 100, 60);
        let analysis = pipeline.analyze(&frame, &red_range()).expect("frame analyzes");

        let target = analysis.selection.target().expect("square is tracked");
        // Morphology grows the square by 4 px on the left/top and 6 px on the right/bottom.
        assert_eq!((target.x, target.y), (130, 130));
        assert_eq!(analysis.mask.get_pixel(96, 96).0[0], MASK_ON);
        assert_eq!(analysis.mask.get_pixel(95, 95).0[0], 0);
    }

    #[test]
    fn raw_mask_is_kept_when_morphology_is_off() {
        let config = TrackerConfig {
            use_morph_ops: false,
            ..TrackerConfig::default()
        };
        let pipeline = TrackingPipeline::new(config);
        let analysis = pipeline
            .analyze(&frame_with_square(100, 100, 60), &red_range())
            .expect("frame analyzes");

        assert_eq!(analysis.mask.get_pixel(100, 100).0[0], MASK_ON);
        assert_eq!(analysis.mask.get_pixel(99, 100).0[0], 0);
        let target = analysis.selection.target().expect("square is tracked");
        assert_eq!((target.x, target.y), (129, 129));
    }

    #[test]
    fn tracking_can_be_switched_off() {
        let config = TrackerConfig {
            track_objects: false,
            ..TrackerConfig::default()
        };
        let pipeline = TrackingPipeline::new(config);
        let analysis = pipeline
            .analyze(&frame_with_square(100, 100, 60), &red_range())
            .expect("frame analyzes");
        assert_eq!(analysis.selection, Selection::NotFound { suppressed: None });
        assert_eq!(analysis.mask.get_pixel(130, 130).0[0], MASK_ON);
    }

    #[test]
    fn wrong_frame_size_is_rejected() {
        let pipeline = TrackingPipeline::new(TrackerConfig::default());
        let err = pipeline.analyze(&RgbImage::new(320, 240), &red_range()).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::FrameSize {
                actual_width: 320,
                actual_height: 240,
                ..
            }
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn process_draws_crosshair_on_the_frame() {
        let pipeline = TrackingPipeline::new(TrackerConfig::default());
        let (annotated, analysis) = pipeline
            .process(frame_with_square(300, 200, 40), &red_range())
            .expect("frame processes");
        let target = analysis.selection.target().expect("square is tracked");

        // The right arm runs from the centroid out to x + 25, past the square.
        let arm = annotated.get_pixel((target.x + 24) as u32, target.y as u32);
        assert_eq!(*arm, Rgb([0, 255, 0]));
    }

    #[test]
    fn missing_font_file_only_disables_text() {
        let config = TrackerConfig {
            font_path: Some("/definitely/not/here.ttf".into()),
            ..TrackerConfig::default()
        };
        let pipeline = TrackingPipeline::new(config);
        let result = pipeline.process(frame_with_square(300, 200, 40), &red_range());
        assert!(result.is_ok());
    }
}
