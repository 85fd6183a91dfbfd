// THEORY:
// The `color_filter` is the first stage of the localisation pipeline. It turns
// an HSV frame into a binary mask: a pixel is "on" when all three of its
// channels sit inside the tunable `HsvRange`, and "off" otherwise.
//
// It is a stateless utility. It never swaps or clamps inverted bounds; a range
// with MIN > MAX on any channel yields an all-off mask, which is exactly what
// the user sees while dragging a slider past its partner.
//
// The functions sit in an inner `color_filter` module, like the other stateless
// stages, so call sites read `color_filter::in_range(..)` once the inner module
// is imported.

use crate::core_modules::color_space::HsvImage;
use crate::core_modules::hsv_range::HsvRange;
use image::{GrayImage, Luma};

/// A single-channel binary image: `MASK_ON` inside the range, `MASK_OFF` outside.
pub type Mask = GrayImage;

pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

pub mod color_filter {
    use super::*;

    /// Thresholds every pixel of `hsv` against `range` (inclusive on both ends).
    pub fn in_range(hsv: &HsvImage, range: &HsvRange) -> Mask {
        let mut mask = Mask::new(hsv.width(), hsv.height());
        for (pixel, out) in hsv.pixels().zip(mask.pixels_mut()) {
            let on = range.contains(pixel.0);
            *out = Luma([if on { MASK_ON } else { MASK_OFF }]);
        }
        mask
    }

    /// Number of "on" pixels, handy for logging how much of the frame matched.
    pub fn coverage(mask: &Mask) -> usize {
        mask.as_raw().iter().filter(|&&v| v != MASK_OFF).count()
    }
}
