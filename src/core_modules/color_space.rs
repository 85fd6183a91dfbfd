// THEORY:
// Colour-space plumbing for the tracker. Cameras hand us BGR bytes, the image
// ecosystem wants RGB, and the colour filter wants HSV. This module owns all
// three conversions so that every later stage can assume a single layout.
//
// HSV here is the 8-bit convention used by common vision toolkits and, more
// importantly, by the slider ranges users tune against:
// - H is the hue angle in degrees halved, so it fits a byte: [0, 180).
// - S is chroma / value scaled to [0, 255].
// - V is the maximum channel, [0, 255].
// Rounding is half-up, which keeps pure primaries on exact values
// (red = 0, green = 60, blue = 120).

use crate::error::{Result, TrackerError};
use image::{ImageBuffer, Rgb, RgbImage};

/// A three-channel image whose channels hold H, S and V (in that order).
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

const HUE_SECTOR: f64 = 30.0; // 60 degrees per sector, halved.
const HUE_RANGE: i32 = 180;

/// Converts one RGB pixel to 8-bit HSV.
pub fn hsv_from_rgb_pixel(red: u8, green: u8, blue: u8) -> [u8; 3] {
    let (r, g, b) = (red as i32, green as i32, blue as i32);
    let value = r.max(g).max(b);
    let minimum = r.min(g).min(b);
    let chroma = value - minimum;

    let saturation = if value == 0 {
        0
    } else {
        (255.0 * chroma as f64 / value as f64 + 0.5).floor() as i32
    };

    let hue = if chroma == 0 {
        0
    } else {
        // Red wins ties, then green, matching the usual max-channel priority.
        let (base_difference, sector_offset) = if value == r {
            (g - b, 0)
        } else if value == g {
            (b - r, 2 * chroma)
        } else {
            (r - g, 4 * chroma)
        };
        let raw = (base_difference + sector_offset) as f64 * HUE_SECTOR / chroma as f64;
        let mut hue = (raw + 0.5).floor() as i32;
        if hue < 0 {
            hue += HUE_RANGE;
        }
        hue
    };

    [hue as u8, saturation as u8, value as u8]
}

/// Converts a whole RGB frame into a freshly allocated HSV frame.
pub fn hsv_from_rgb(frame: &RgbImage) -> HsvImage {
    let mut hsv = HsvImage::new(frame.width(), frame.height());
    for (source, target) in frame.pixels().zip(hsv.pixels_mut()) {
        let [r, g, b] = source.0;
        *target = Rgb(hsv_from_rgb_pixel(r, g, b));
    }
    hsv
}

/// Builds an RGB frame from a tightly packed BGR buffer (camera order).
pub fn rgb_from_bgr(width: u32, height: u32, bgr: &[u8]) -> Result<RgbImage> {
    let expected = width as usize * height as usize * 3;
    if bgr.len() != expected {
        return Err(TrackerError::BufferSize {
            expected,
            actual: bgr.len(),
        });
    }

    let mut rgb = Vec::with_capacity(expected);
    for pixel in bgr.chunks_exact(3) {
        rgb.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
    }

    RgbImage::from_raw(width, height, rgb).ok_or(TrackerError::BufferSize {
        expected,
        actual: bgr.len(),
    })
}

/// Flattens an RGB frame back into BGR bytes for display surfaces that expect them.
pub fn bgr_bytes(frame: &RgbImage) -> Vec<u8> {
    let mut bgr = Vec::with_capacity(frame.as_raw().len());
    for pixel in frame.pixels() {
        let [r, g, b] = pixel.0;
        bgr.extend_from_slice(&[b, g, r]);
    }
    bgr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_land_on_exact_hues() {
        assert_eq!(hsv_from_rgb_pixel(255, 0, 0), [0, 255, 255]);
        assert_eq!(hsv_from_rgb_pixel(0, 255, 0), [60, 255, 255]);
        assert_eq!(hsv_from_rgb_pixel(0, 0, 255), [120, 255, 255]);
        assert_eq!(hsv_from_rgb_pixel(255, 255, 0), [30, 255, 255]);
    }

    #[test]
    fn negative_hues_wrap_into_range() {
        // Magenta sits at 300 degrees, i.e. 150 on the halved scale.
        assert_eq!(hsv_from_rgb_pixel(255, 0, 255), [150, 255, 255]);
        let [hue, _, _] = hsv_from_rgb_pixel(255, 0, 1);
        assert_eq!(hue, 0);
        let [hue, _, _] = hsv_from_rgb_pixel(255, 0, 20);
        assert!(hue > 170 && hue < 180);
    }

    #[test]
    fn grays_have_no_saturation() {
        assert_eq!(hsv_from_rgb_pixel(0, 0, 0), [0, 0, 0]);
        assert_eq!(hsv_from_rgb_pixel(128, 128, 128), [0, 0, 128]);
        assert_eq!(hsv_from_rgb_pixel(255, 255, 255), [0, 0, 255]);
    }

    #[test]
    fn half_saturated_pixel_rounds_half_up() {
        // chroma 100 over value 200 -> 127.5 -> 128
        assert_eq!(hsv_from_rgb_pixel(200, 100, 100), [0, 128, 200]);
    }

    #[test]
    fn bgr_round_trip_preserves_channels() {
        let bgr = vec![10, 20, 30, 40, 50, 60];
        let rgb = rgb_from_bgr(2, 1, &bgr).expect("valid buffer");
        assert_eq!(rgb.get_pixel(0, 0).0, [30, 20, 10]);
        assert_eq!(rgb.get_pixel(1, 0).0, [60, 50, 40]);
        assert_eq!(bgr_bytes(&rgb), bgr);
    }

    #[test]
    fn short_bgr_buffer_is_rejected() {
        let err = rgb_from_bgr(4, 4, &[0u8; 10]).unwrap_err();
        assert!(matches!(err, TrackerError::BufferSize { expected: 48, actual: 10 }));
    }

    #[test]
    fn frame_conversion_matches_pixel_conversion() {
        let mut frame = RgbImage::new(3, 1);
        frame.put_pixel(0, 0, Rgb([255, 0, 0]));
        frame.put_pixel(1, 0, Rgb([0, 255, 0]));
        frame.put_pixel(2, 0, Rgb([12, 34, 56]));
        let hsv = hsv_from_rgb(&frame);
        assert_eq!(hsv.get_pixel(0, 0).0, [0, 255, 255]);
        assert_eq!(hsv.get_pixel(1, 0).0, [60, 255, 255]);
        assert_eq!(hsv.get_pixel(2, 0).0, hsv_from_rgb_pixel(12, 34, 56));
    }
}
