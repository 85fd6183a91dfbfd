// THEORY:
// The `MorphologyCleaner` suppresses speckle in the threshold mask before any
// contour is traced. Its recipe is fixed: erode with a small rectangle, erode
// again, then dilate twice with a larger rectangle. The erosions wipe out
// isolated specks; the oversized dilations regrow whatever survived and weld
// nearby fragments of one object into a single blob.
//
// Both passes run on `imageproc`'s grayscale morphology with a filled
// rectangular structuring element. The anchor sits at `size / 2`, so an even
// kernel reaches one pixel further up/left than down/right. Pixels outside the
// image never participate, which means the border neither erodes nor dilates
// anything.

use crate::core_modules::color_filter::Mask;
use crate::config::TrackerConfig;
use image::{GrayImage, Luma};
use imageproc::morphology::{self, grayscale_dilate, grayscale_erode};

/// Largest kernel side `imageproc` accepts for a structuring element.
const MAX_KERNEL: u32 = 511;

/// Filled `size`x`size` structuring element anchored at `size / 2`.
fn rect_element(size: u32) -> morphology::Mask {
    let size = size.clamp(1, MAX_KERNEL);
    let anchor = (size / 2) as u8;
    let footprint = GrayImage::from_pixel(size, size, Luma([u8::MAX]));
    morphology::Mask::from_image(&footprint, anchor, anchor)
}

/// Erode-erode-dilate-dilate noise suppression for binary masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphologyCleaner {
    pub enabled: bool,
    pub erode_kernel: u32,
    pub erode_iterations: u32,
    pub dilate_kernel: u32,
    pub dilate_iterations: u32,
}

impl Default for MorphologyCleaner {
    fn default() -> Self {
        Self {
            enabled: true,
            erode_kernel: 3,
            erode_iterations: 2,
            dilate_kernel: 8,
            dilate_iterations: 2,
        }
    }
}

impl MorphologyCleaner {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            enabled: config.use_morph_ops,
            erode_kernel: config.erode_kernel,
            erode_iterations: config.erode_iterations,
            dilate_kernel: config.dilate_kernel,
            dilate_iterations: config.dilate_iterations,
        }
    }

    /// Returns the cleaned mask. When disabled the input is passed through as a copy.
    pub fn clean(&self, mask: &Mask) -> Mask {
        let mut working = mask.clone();
        if !self.enabled {
            return working;
        }
        let erode_element = rect_element(self.erode_kernel);
        for _ in 0..self.erode_iterations {
            working = grayscale_erode(&working, &erode_element);
        }
        let dilate_element = rect_element(self.dilate_kernel);
        for _ in 0..self.dilate_iterations {
            working = grayscale_dilate(&working, &dilate_element);
        }
        working
    }
}

/// Erodes with a `size`x`size` rectangle.
pub fn erode(mask: &Mask, size: u32) -> Mask {
    grayscale_erode(mask, &rect_element(size))
}

/// Dilates with a `size`x`size` rectangle.
pub fn dilate(mask: &Mask, size: u32) -> Mask {
    grayscale_dilate(mask, &rect_element(size))
}
