//! Leaf plausibility check: does the photo contain enough foliage?
//!
//! Advisory only. Hosts may warn on a failed check, but the pipeline
//! itself runs on any image.

use image::RgbImage;

use crate::color::HsvPlanes;
use crate::mask;

/// Lower HSV bound of "green enough" pixels.
pub const GREEN_LOWER: [u8; 3] = [35, 50, 30];

/// Upper HSV bound of "green enough" pixels.
pub const GREEN_UPPER: [u8; 3] = [85, 255, 255];

/// Share of green pixels an image must exceed to look like a leaf.
pub const MIN_GREEN_RATIO: f64 = 0.1;

/// Fraction of pixels inside the green HSV band. 0 for an empty image.
#[must_use]
pub fn green_ratio(image: &RgbImage) -> f64 {
    let total = u64::from(image.width()) * u64::from(image.height());
    if total == 0 {
        return 0.0;
    }
    let planes = HsvPlanes::from_rgb(image);
    let green = mask::count_set(&mask::in_range(&planes, GREEN_LOWER, GREEN_UPPER));
    #[allow(clippy::cast_precision_loss)]
    let ratio = green as f64 / total as f64;
    log::trace!("validate: {green} of {total} pixels are green");
    ratio
}

/// Whether more than [`MIN_GREEN_RATIO`] of the image is green.
#[must_use]
pub fn looks_like_leaf(image: &RgbImage) -> bool {
    green_ratio(image) > MIN_GREEN_RATIO
}
