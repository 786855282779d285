//! Leaf segmentation: isolate the single leaf in a photograph.
//!
//! 1. Band-threshold the image in HSV.
//! 2. Close then open the mask with a small disk.
//! 3. Trace external contours.
//! 4. Keep contours that are large enough and leaf-shaped (elongated),
//!    falling back to every contour when none qualifies.
//! 5. The largest remaining contour is the leaf; rasterize it filled.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::color::HsvPlanes;
use crate::contour::{Contour, find_external_contours};
use crate::mask;
use crate::overlay;
use crate::types::{Dimensions, GrayImage};

/// Default lower hue bound of the leaf band (half-degrees).
pub const DEFAULT_LEAF_HUE_MIN: u8 = 35;

/// Default upper hue bound of the leaf band (half-degrees).
pub const DEFAULT_LEAF_HUE_MAX: u8 = 85;

/// Default minimum saturation of leaf pixels.
pub const DEFAULT_SAT_MIN: u8 = 50;

/// Default minimum value (brightness) of leaf pixels.
pub const DEFAULT_VAL_MIN: u8 = 20;

/// Default minimum leaf area as a fraction of the image area.
pub const DEFAULT_MIN_AREA_RATIO: f64 = 0.01;

/// Absolute floor on the leaf candidate area, in pixels.
pub const MIN_LEAF_AREA: f64 = 800.0;

/// Open interval of bounding-box aspect ratios (width / height) that
/// counts as leaf-shaped.
pub const LEAF_ASPECT_RANGE: (f64, f64) = (0.2, 0.7);

/// Disk radius for the close/open cleanup.
pub const CLEANUP_RADIUS: u8 = 3;

/// Leaf segmentation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Lower hue bound, inclusive.
    pub hue_min: u8,
    /// Upper hue bound, inclusive.
    pub hue_max: u8,
    /// Minimum saturation, inclusive.
    pub sat_min: u8,
    /// Minimum value, inclusive.
    pub val_min: u8,
    /// Candidate contours must enclose at least this share of the
    /// image (and never less than [`MIN_LEAF_AREA`]).
    pub min_area_ratio: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            hue_min: DEFAULT_LEAF_HUE_MIN,
            hue_max: DEFAULT_LEAF_HUE_MAX,
            sat_min: DEFAULT_SAT_MIN,
            val_min: DEFAULT_VAL_MIN,
            min_area_ratio: DEFAULT_MIN_AREA_RATIO,
        }
    }
}

/// Output of [`segment`].
#[derive(Debug, Clone)]
pub struct LeafSegmentation {
    /// Filled leaf mask, same dimensions as the image.
    pub mask: GrayImage,
    /// Outer boundary of the leaf, if one was found.
    pub contour: Option<Contour>,
    /// Copy of the image with the leaf outline drawn on it.
    pub overlay: RgbImage,
}

impl LeafSegmentation {
    /// Number of leaf pixels.
    #[must_use]
    pub fn leaf_area(&self) -> u64 {
        mask::count_set(&self.mask)
    }

    /// Whether no leaf was found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.contour.is_none()
    }
}

/// Segment the leaf from `image`.
///
/// Never fails: an image with nothing in the leaf band yields an empty
/// mask, no contour, and an unmodified overlay.
#[must_use = "returns the leaf mask, contour, and overlay"]
pub fn segment(image: &RgbImage, config: &SegmentConfig) -> LeafSegmentation {
    let dimensions = Dimensions::of(image);
    if dimensions.area() == 0 {
        log::debug!("segment: {dimensions} image has no pixels");
        return LeafSegmentation {
            mask: GrayImage::new(dimensions.width, dimensions.height),
            contour: None,
            overlay: image.clone(),
        };
    }
    let planes = HsvPlanes::from_rgb(image);

    let band = mask::in_range(
        &planes,
        [config.hue_min, config.sat_min, config.val_min],
        [config.hue_max, u8::MAX, u8::MAX],
    );
    let cleaned = mask::open(&mask::close(&band, CLEANUP_RADIUS), CLEANUP_RADIUS);

    let contours = find_external_contours(&cleaned);
    log::debug!(
        "segment: {} band pixels, {} contours after cleanup",
        mask::count_set(&band),
        contours.len()
    );

    let Some(leaf) = select_leaf(contours, min_leaf_area(dimensions, config.min_area_ratio)) else {
        return LeafSegmentation {
            mask: GrayImage::new(dimensions.width, dimensions.height),
            contour: None,
            overlay: image.clone(),
        };
    };

    let leaf_mask = mask::fill_contour(dimensions, &leaf);
    let leaf_overlay = overlay::leaf_outline(image, &leaf);
    log::debug!(
        "segment: leaf contour of {} points, area {:.0}, {} mask pixels",
        leaf.len(),
        leaf.area(),
        mask::count_set(&leaf_mask)
    );

    LeafSegmentation {
        mask: leaf_mask,
        contour: Some(leaf),
        overlay: leaf_overlay,
    }
}

/// `max(floor(image_area * ratio), MIN_LEAF_AREA)`.
#[must_use]
pub fn min_leaf_area(dimensions: Dimensions, min_area_ratio: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let image_area = dimensions.area() as f64;
    (image_area * min_area_ratio).floor().max(MIN_LEAF_AREA)
}

/// Whether a contour's bounding box is elongated like a leaf.
#[must_use]
pub fn is_leaf_shaped(contour: &Contour) -> bool {
    let (lo, hi) = LEAF_ASPECT_RANGE;
    let aspect = contour.aspect_ratio();
    lo < aspect && aspect < hi
}

/// Pick the leaf among candidate contours.
///
/// Prefers contours that are at least `min_area` and leaf-shaped; when
/// none qualifies every contour is a candidate. The largest area wins;
/// on a tie the earliest contour is kept.
#[must_use]
pub fn select_leaf(contours: Vec<Contour>, min_area: f64) -> Option<Contour> {
    let (qualified, rest): (Vec<Contour>, Vec<Contour>) = contours
        .into_iter()
        .partition(|c| c.area() >= min_area && is_leaf_shaped(c));

    let candidates = if qualified.is_empty() {
        log::trace!("segment: no leaf-shaped contour, considering all {}", rest.len());
        rest
    } else {
        qualified
    };

    candidates.into_iter().fold(None, |best: Option<(f64, Contour)>, c| {
        let area = c.area();
        match best {
            Some((best_area, _)) if best_area >= area => best,
            _ => Some((area, c)),
        }
    })
    .map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use image::{Luma, Rgb};
    use imageproc::drawing::{draw_filled_ellipse_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    use super::*;
    use crate::types::Point;

    const LEAF_GREEN: Rgb<u8> = Rgb([40, 160, 40]);

    fn rect_contour(x: i32, y: i32, w: i32, h: i32) -> Contour {
        Contour::new(vec![
            Point::new(x, y),
            Point::new(x + w - 1, y),
            Point::new(x + w - 1, y + h - 1),
            Point::new(x, y + h - 1),
        ])
    }

    #[test]
    fn blank_image_yields_empty_result() {
        let image = RgbImage::from_pixel(64, 48, Rgb([255, 255, 255]));
        let result = segment(&image, &SegmentConfig::default());
        assert!(result.is_empty());
        assert!(mask::is_empty(&result.mask));
        assert_eq!(result.mask.dimensions(), (64, 48));
        assert_eq!(result.overlay, image);
    }

    #[test]
    fn zero_sized_image_yields_empty_result() {
        for (w, h) in [(0, 0), (0, 40), (40, 0)] {
            let image = RgbImage::new(w, h);
            let result = segment(&image, &SegmentConfig::default());
            assert!(result.is_empty());
            assert_eq!(result.mask.dimensions(), (w, h));
            assert_eq!(result.overlay, image);
        }
    }

    #[test]
    fn elongated_green_ellipse_is_found() {
        let mut image = RgbImage::from_pixel(200, 300, Rgb([255, 255, 255]));
        draw_filled_ellipse_mut(&mut image, (100, 150), 50, 110, LEAF_GREEN);
        let result = segment(&image, &SegmentConfig::default());

        let contour = result.contour.as_ref();
        assert!(contour.is_some());
        let rect = contour.and_then(Contour::bounding_rect);
        let (width, height) = rect.map_or((0, 0), |r| (r.width, r.height));
        assert!(width.abs_diff(101) <= 2, "width {width}");
        assert!(height.abs_diff(221) <= 2, "height {height}");

        // Filled mask covers the drawn ellipse closely.
        let drawn = u64::try_from(image.pixels().filter(|p| **p == LEAF_GREEN).count()).unwrap_or(0);
        let area = result.leaf_area();
        assert!(area.abs_diff(drawn) * 50 < drawn, "mask {area} vs drawn {drawn}");

        assert_eq!(*result.overlay.get_pixel(100, 41), overlay::LEAF_OUTLINE_COLOR);
        assert_eq!(*result.overlay.get_pixel(100, 150), LEAF_GREEN);
    }

    #[test]
    fn fallback_when_nothing_is_leaf_shaped() {
        let mut image = RgbImage::from_pixel(120, 120, Rgb([255, 255, 255]));
        // A square: aspect ratio 1, outside the leaf band.
        draw_filled_rect_mut(&mut image, Rect::at(20, 20).of_size(60, 60), LEAF_GREEN);
        let result = segment(&image, &SegmentConfig::default());
        assert!(!result.is_empty());
        assert!(result.leaf_area() > 3000);
    }

    #[test]
    fn leaf_shaped_beats_larger_square() {
        let contours = vec![
            rect_contour(0, 0, 100, 100),
            rect_contour(200, 0, 40, 100),
        ];
        let leaf = select_leaf(contours, 800.0);
        assert_eq!(leaf.and_then(|c| c.bounding_rect()).map(|r| r.x), Some(200));
    }

    #[test]
    fn small_leaf_shape_loses_to_area_floor() {
        // Leaf-shaped but under the floor, so no contour qualifies and the
        // larger square wins the fallback.
        let contours = vec![rect_contour(0, 0, 10, 30), rect_contour(100, 0, 50, 50)];
        let leaf = select_leaf(contours, 800.0);
        assert_eq!(leaf.and_then(|c| c.bounding_rect()).map(|r| r.x), Some(100));
    }

    #[test]
    fn tie_keeps_first() {
        let contours = vec![
            rect_contour(0, 0, 40, 100),
            rect_contour(100, 0, 40, 100),
        ];
        let leaf = select_leaf(contours, 800.0);
        assert_eq!(leaf.and_then(|c| c.bounding_rect()).map(|r| r.x), Some(0));
    }

    #[test]
    fn min_area_has_absolute_floor() {
        let small = Dimensions {
            width: 100,
            height: 100,
        };
        assert!((min_leaf_area(small, 0.01) - MIN_LEAF_AREA).abs() < f64::EPSILON);
        let large = Dimensions {
            width: 1000,
            height: 1000,
        };
        assert!((min_leaf_area(large, 0.01) - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aspect_band_is_exclusive() {
        assert!(!is_leaf_shaped(&rect_contour(0, 0, 20, 100)));
        assert!(is_leaf_shaped(&rect_contour(0, 0, 21, 100)));
        assert!(!is_leaf_shaped(&rect_contour(0, 0, 70, 100)));
    }

    #[test]
    fn closing_fills_speckled_leaf() {
        let mut image = RgbImage::from_pixel(120, 200, Rgb([255, 255, 255]));
        draw_filled_ellipse_mut(&mut image, (60, 100), 30, 80, LEAF_GREEN);
        // Pepper the leaf with single background pixels.
        for y in (30..170).step_by(9) {
            image.put_pixel(60, y, Rgb([255, 255, 255]));
        }
        let result = segment(&image, &SegmentConfig::default());
        assert_eq!(result.mask.get_pixel(60, 101), &Luma([mask::SET]));
        assert_eq!(find_external_contours(&result.mask).len(), 1);
    }
}
