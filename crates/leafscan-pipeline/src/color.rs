//! Color space conversion: RGB to 8-bit HSV and CIE L\*a\*b\*.
//!
//! Hue uses the half-circle convention (`0..=179`, degrees halved) so a
//! hue value fits a single byte. Saturation and value span `0..=255`.

use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use palette::{FromColor, Lab, Srgb};

use crate::types::Dimensions;

/// Convert one RGB pixel to 8-bit HSV `(hue, saturation, value)`.
///
/// `value` is the largest channel. `saturation` is the channel spread
/// relative to `value`, scaled to `0..=255`. `hue` is measured in
/// half-degrees; when several channels tie for the maximum, red takes
/// precedence over green, and green over blue. Gray pixels (all
/// channels equal) have hue 0. All divisions round half up.
#[must_use]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let spread = max - min;

    let saturation = if max == 0 {
        0
    } else {
        round_half_up(f64::from(spread * 255) / f64::from(max))
    };

    let hue = if spread == 0 {
        0
    } else {
        let sector = if max == r {
            g - b
        } else if max == g {
            b - r + 2 * spread
        } else {
            r - g + 4 * spread
        };
        let h = round_half_up(f64::from(sector * 30) / f64::from(spread));
        if h < 0 { h + 180 } else { h }
    };

    (clamp_u8(hue), clamp_u8(saturation), clamp_u8(max))
}

#[allow(clippy::cast_possible_truncation)]
fn round_half_up(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn clamp_u8(x: i32) -> u8 {
    if x < 0 {
        0
    } else if x > 255 {
        255
    } else {
        x as u8
    }
}

/// Hue, saturation, and value planes of an RGB image.
#[derive(Debug, Clone)]
pub struct HsvPlanes {
    /// Hue in half-degrees (`0..=179`).
    pub hue: GrayImage,
    /// Saturation (`0..=255`).
    pub saturation: GrayImage,
    /// Value, the brightest channel (`0..=255`).
    pub value: GrayImage,
}

impl HsvPlanes {
    /// Split an RGB image into HSV planes.
    #[must_use]
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let mut hue = GrayImage::new(width, height);
        let mut saturation = GrayImage::new(width, height);
        let mut value = GrayImage::new(width, height);

        for (x, y, pixel) in image.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let (h, s, v) = rgb_to_hsv(r, g, b);
            hue.put_pixel(x, y, Luma([h]));
            saturation.put_pixel(x, y, Luma([s]));
            value.put_pixel(x, y, Luma([v]));
        }

        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Dimensions shared by all three planes.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.hue)
    }
}

/// Hue plane only, for stages that never look at saturation or value.
#[must_use]
pub fn hue_plane(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Luma([rgb_to_hsv(r, g, b).0])
    })
}

/// Single-channel floating-point plane.
pub type FloatPlane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// CIE L\*a\*b\* (D65) a\* value per pixel.
///
/// Negative values lean green, positive values lean red.
#[must_use]
pub fn a_star_plane(image: &RgbImage) -> FloatPlane {
    let (width, height) = image.dimensions();
    FloatPlane::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let lab: Lab = Lab::from_color(Srgb::new(r, g, b).into_format::<f32>());
        Luma([lab.a])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_map_to_expected_hues() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255));
        assert_eq!(rgb_to_hsv(0, 255, 0), (60, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 255), (120, 255, 255));
    }

    #[test]
    fn secondaries_map_to_expected_hues() {
        assert_eq!(rgb_to_hsv(255, 255, 0).0, 30);
        assert_eq!(rgb_to_hsv(0, 255, 255).0, 90);
        assert_eq!(rgb_to_hsv(255, 0, 255).0, 150);
    }

    #[test]
    fn gray_has_zero_hue_and_saturation() {
        assert_eq!(rgb_to_hsv(128, 128, 128), (0, 0, 128));
        assert_eq!(rgb_to_hsv(0, 0, 0), (0, 0, 0));
        assert_eq!(rgb_to_hsv(255, 255, 255), (0, 0, 255));
    }

    #[test]
    fn leaf_green_is_in_the_green_band() {
        let (h, s, v) = rgb_to_hsv(40, 160, 40);
        assert_eq!(h, 60);
        assert_eq!(s, 191);
        assert_eq!(v, 160);
    }

    #[test]
    fn brown_is_low_hue() {
        let (h, _, _) = rgb_to_hsv(120, 60, 20);
        assert_eq!(h, 12);
    }

    #[test]
    fn reddish_magenta_wraps_below_180() {
        // Red is max, blue above green: negative sector wraps around.
        let (h, _, _) = rgb_to_hsv(255, 0, 40);
        assert!(h > 170 && h <= 179, "expected wrapped hue, got {h}");
    }

    #[test]
    fn hue_never_exceeds_179() {
        for r in (0..=255).step_by(15) {
            for g in (0..=255).step_by(15) {
                for b in (0..=255).step_by(15) {
                    let (h, _, _) = rgb_to_hsv(r, g, b);
                    assert!(h <= 179, "rgb({r},{g},{b}) -> hue {h}");
                }
            }
        }
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn planes_match_per_pixel_conversion() {
        let img = RgbImage::from_fn(4, 3, |x, y| image::Rgb([(x * 60) as u8, (y * 80) as u8, 30]));
        let planes = HsvPlanes::from_rgb(&img);
        assert_eq!(
            planes.dimensions(),
            Dimensions {
                width: 4,
                height: 3
            }
        );
        for (x, y, p) in img.enumerate_pixels() {
            let (h, s, v) = rgb_to_hsv(p.0[0], p.0[1], p.0[2]);
            assert_eq!(planes.hue.get_pixel(x, y).0[0], h);
            assert_eq!(planes.saturation.get_pixel(x, y).0[0], s);
            assert_eq!(planes.value.get_pixel(x, y).0[0], v);
        }
        assert_eq!(hue_plane(&img), planes.hue);
    }

    #[test]
    fn a_star_separates_green_from_red() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([40, 160, 40])
            } else {
                image::Rgb([160, 60, 30])
            }
        });
        let a = a_star_plane(&img);
        assert!(a.get_pixel(0, 0).0[0] < 0.0);
        assert!(a.get_pixel(1, 0).0[0] > 10.0);
    }
}
