// THEORY:
// The `Annotator` is the only stage that writes on the picture the user sees.
// It turns a `Selection` into a crosshair (circle, four arms, coordinate label)
// and a one-line status message.
//
// Drawing goes through the small `Surface` trait, not a concrete image type.
// `ImageSurface` renders onto an `RgbImage` with `imageproc`; a live display
// can provide its own surface; tests record the calls instead of rasterising.

use crate::core_modules::object_selector::Selection;
use crate::error::{Result, TrackerError};
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::point::Point;
use std::path::Path;

pub const TRACKING_MESSAGE: &str = "Tracking Object";
pub const NOISE_MESSAGE: &str = "TOO MUCH NOISE! ADJUST FILTER";

const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const MARKER_THICKNESS: u32 = 2;
const CIRCLE_RADIUS: i32 = 20;
const ARM_LENGTH: i32 = 25;
const LABEL_OFFSET: i32 = 30;
const STATUS_ORIGIN: Point<i32> = Point { x: 0, y: 25 };

/// Colour and width of an outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub color: Rgb<u8>,
    pub thickness: u32,
}

/// Typeface families a surface is asked to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    /// Small, thin face used for coordinate labels.
    Plain,
    /// Larger face used for status messages.
    Duplex,
}

impl FontFace {
    /// Nominal glyph height in pixels at scale 1.0.
    pub fn pixel_height(self) -> f32 {
        match self {
            FontFace::Plain => 16.0,
            FontFace::Duplex => 24.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub scale: f32,
    pub stroke: Stroke,
}

/// The drawing primitives the annotator needs from a display.
pub trait Surface {
    /// Width and height in pixels.
    fn dimensions(&self) -> (u32, u32);
    fn draw_circle(&mut self, center: Point<i32>, radius: i32, stroke: Stroke);
    fn draw_line(&mut self, from: Point<i32>, to: Point<i32>, stroke: Stroke);
    /// `origin` is the bottom-left corner of the text's baseline.
    fn draw_text(&mut self, origin: Point<i32>, text: &str, style: TextStyle);
}

/// Draws the selection outcome onto a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotator {
    stroke: Stroke,
}

impl Default for Annotator {
    fn default() -> Self {
        Self {
            stroke: Stroke {
                color: MARKER_COLOR,
                thickness: MARKER_THICKNESS,
            },
        }
    }
}

impl Annotator {
    pub fn annotate<S: Surface + ?Sized>(&self, surface: &mut S, selection: &Selection) {
        match selection {
            Selection::Tracking(target) => {
                self.draw_status(surface, TRACKING_MESSAGE);
                self.draw_object(surface, target.x, target.y);
            }
            Selection::TooMuchNoise { .. } => self.draw_status(surface, NOISE_MESSAGE),
            Selection::NotFound { .. } => {}
        }
    }

    pub fn draw_status<S: Surface + ?Sized>(&self, surface: &mut S, message: &str) {
        let style = TextStyle {
            face: FontFace::Duplex,
            scale: 1.0,
            stroke: self.stroke,
        };
        surface.draw_text(STATUS_ORIGIN, message, style);
    }

    /// Crosshair at `(x, y)`. Arms stop at the frame edges.
    pub fn draw_object<S: Surface + ?Sized>(&self, surface: &mut S, x: i32, y: i32) {
        let (width, height) = surface.dimensions();
        let (width, height) = (width as i32, height as i32);
        let center = Point::new(x, y);

        surface.draw_circle(center, CIRCLE_RADIUS, self.stroke);

        let up = if y - ARM_LENGTH > 0 { y - ARM_LENGTH } else { 0 };
        let down = if y + ARM_LENGTH < height { y + ARM_LENGTH } else { height };
        let left = if x - ARM_LENGTH > 0 { x - ARM_LENGTH } else { 0 };
        let right = if x + ARM_LENGTH < width { x + ARM_LENGTH } else { width };

        surface.draw_line(center, Point::new(x, up), self.stroke);
        surface.draw_line(center, Point::new(x, down), self.stroke);
        surface.draw_line(center, Point::new(left, y), self.stroke);
        surface.draw_line(center, Point::new(right, y), self.stroke);

        let label = TextStyle {
            face: FontFace::Plain,
            scale: 1.0,
            stroke: self.stroke,
        };
        surface.draw_text(Point::new(x, y + LABEL_OFFSET), &format!("{x},{y}"), label);
    }
}

/// Reads a TrueType/OpenType font for on-frame text.
pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)?;
    FontArc::try_from_vec(bytes).map_err(|e| TrackerError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// A `Surface` backed by an in-memory RGB frame.
pub struct ImageSurface<'a> {
    image: &'a mut RgbImage,
    font: Option<&'a FontArc>,
}

impl<'a> ImageSurface<'a> {
    /// Without a font, text requests are skipped.
    pub fn new(image: &'a mut RgbImage, font: Option<&'a FontArc>) -> Self {
        Self { image, font }
    }
}

impl Surface for ImageSurface<'_> {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn draw_circle(&mut self, center: Point<i32>, radius: i32, stroke: Stroke) {
        let thickness = stroke.thickness.max(1) as i32;
        for ring in 0..thickness {
            let r = radius - thickness / 2 + ring;
            if r > 0 {
                draw_hollow_circle_mut(self.image, (center.x, center.y), r, stroke.color);
            }
        }
    }

    fn draw_line(&mut self, from: Point<i32>, to: Point<i32>, stroke: Stroke) {
        let thickness = stroke.thickness.max(1) as i32;
        // Widen across the dominant direction of the segment.
        let horizontal = (to.x - from.x).abs() >= (to.y - from.y).abs();
        for band in 0..thickness {
            let offset = (band - thickness / 2) as f32;
            let (dx, dy) = if horizontal { (0.0, offset) } else { (offset, 0.0) };
            draw_line_segment_mut(
                self.image,
                (from.x as f32 + dx, from.y as f32 + dy),
                (to.x as f32 + dx, to.y as f32 + dy),
                stroke.color,
            );
        }
    }

    fn draw_text(&mut self, origin: Point<i32>, text: &str, style: TextStyle) {
        let Some(font) = self.font else {
            log::debug!("no font loaded, skipping label {text:?}");
            return;
        };
        let scale = PxScale::from(style.face.pixel_height() * style.scale);
        let top = origin.y - scale.y as i32;
        for pass in 0..style.stroke.thickness.max(1) as i32 {
            draw_text_mut(self.image, style.stroke.color, origin.x + pass, top, scale, font, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::object_selector::Target;
    use std::io::Write;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Circle((i32, i32), i32),
        Line((i32, i32), (i32, i32)),
        Text((i32, i32), String, FontFace),
    }

    struct Recorder {
        size: (u32, u32),
        calls: Vec<Call>,
    }

    impl Recorder {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                calls: Vec::new(),
            }
        }
    }

    impl Surface for Recorder {
        fn dimensions(&self) -> (u32, u32) {
            self.size
        }
        fn draw_circle(&mut self, center: Point<i32>, radius: i32, _: Stroke) {
            self.calls.push(Call::Circle((center.x, center.y), radius));
        }
        fn draw_line(&mut self, from: Point<i32>, to: Point<i32>, _: Stroke) {
            self.calls.push(Call::Line((from.x, from.y), (to.x, to.y)));
        }
        fn draw_text(&mut self, origin: Point<i32>, text: &str, style: TextStyle) {
            self.calls.push(Call::Text((origin.x, origin.y), text.to_string(), style.face));
        }
    }

    fn tracking(x: i32, y: i32) -> Selection {
        Selection::Tracking(Target { x, y, area: 900.0 })
    }

    #[test]
    fn centred_object_gets_full_crosshair_and_label() {
        let mut surface = Recorder::new(640, 480);
        Annotator::default().annotate(&mut surface, &tracking(320, 240));
        assert_eq!(
            surface.calls,
            vec![
                Call::Text((0, 25), TRACKING_MESSAGE.to_string(), FontFace::Duplex),
                Call::Circle((320, 240), 20),
                Call::Line((320, 240), (320, 215)),
                Call::Line((320, 240), (320, 265)),
                Call::Line((320, 240), (295, 240)),
                Call::Line((320, 240), (345, 240)),
                Call::Text((320, 270), "320,240".to_string(), FontFace::Plain),
            ]
        );
    }

    #[test]
    fn arms_are_clamped_at_frame_edges() {
        let mut surface = Recorder::new(640, 480);
        Annotator::default().draw_object(&mut surface, 10, 470);
        let lines: Vec<_> = surface
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Line(..)))
            .cloned()
            .collect();
        assert_eq!(
            lines,
            vec![
                Call::Line((10, 470), (10, 445)),
                Call::Line((10, 470), (10, 480)),
                Call::Line((10, 470), (0, 470)),
                Call::Line((10, 470), (35, 470)),
            ]
        );

        let mut surface = Recorder::new(640, 480);
        Annotator::default().draw_object(&mut surface, 630, 25);
        assert!(surface.calls.contains(&Call::Line((630, 25), (630, 0))));
        assert!(surface.calls.contains(&Call::Line((630, 25), (640, 25))));
    }

    #[test]
    fn noise_shows_only_the_warning() {
        let mut surface = Recorder::new(640, 480);
        Annotator::default().annotate(&mut surface, &Selection::TooMuchNoise { contour_count: 80 });
        assert_eq!(
            surface.calls,
            vec![Call::Text((0, 25), NOISE_MESSAGE.to_string(), FontFace::Duplex)]
        );
    }

    #[test]
    fn not_found_draws_nothing() {
        let mut surface = Recorder::new(640, 480);
        let suppressed = Some(Target { x: 1, y: 2, area: 500.0 });
        Annotator::default().annotate(&mut surface, &Selection::NotFound { suppressed });
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn image_surface_rasterises_circle_and_arms() {
        let mut image = RgbImage::new(200, 200);
        {
            let mut surface = ImageSurface::new(&mut image, None);
            Annotator::default().annotate(&mut surface, &tracking(100, 100));
        }
        assert_eq!(*image.get_pixel(120, 100), MARKER_COLOR); // circle, right edge
        assert_eq!(*image.get_pixel(100, 80), MARKER_COLOR); // circle top, also on the up arm
        assert_eq!(*image.get_pixel(100, 124), MARKER_COLOR); // down arm
        assert_eq!(*image.get_pixel(76, 100), MARKER_COLOR); // left arm
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(160, 160), Rgb([0, 0, 0]));
    }

    #[test]
    fn invalid_font_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"definitely not a font").expect("write");
        let err = load_font(file.path()).unwrap_err();
        assert!(matches!(err, TrackerError::Font { .. }));
    }
}
