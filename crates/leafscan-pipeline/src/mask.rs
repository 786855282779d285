//! Binary masks: band thresholds, boolean combination, morphology, and
//! contour rasterization.
//!
//! A mask is a [`GrayImage`] whose pixels are either [`UNSET`] (0) or
//! [`SET`] (255). Every function here returns a normalized mask even if
//! its inputs hold other gray levels; any nonzero input pixel counts as
//! set.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::morphology::{Mask, grayscale_close, grayscale_open};

use crate::color::{FloatPlane, HsvPlanes};
use crate::contour::Contour;
use crate::types::Dimensions;

/// Pixel value of a set mask cell.
pub const SET: u8 = 255;

/// Pixel value of an unset mask cell.
pub const UNSET: u8 = 0;

const fn level(set: bool) -> Luma<u8> {
    if set { Luma([SET]) } else { Luma([UNSET]) }
}

/// Inclusive band test on all three HSV channels.
///
/// A pixel is set when `lower[c] <= plane[c] <= upper[c]` holds for
/// hue, saturation, and value alike.
#[must_use]
pub fn in_range(planes: &HsvPlanes, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    let (width, height) = planes.hue.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let h = planes.hue.get_pixel(x, y).0[0];
        let s = planes.saturation.get_pixel(x, y).0[0];
        let v = planes.value.get_pixel(x, y).0[0];
        level(
            (lower[0]..=upper[0]).contains(&h)
                && (lower[1]..=upper[1]).contains(&s)
                && (lower[2]..=upper[2]).contains(&v),
        )
    })
}

/// Inclusive band test on a single hue plane.
///
/// An inverted band (`min > max`) selects nothing.
#[must_use]
pub fn hue_in_range(hue: &GrayImage, min: u8, max: u8) -> GrayImage {
    let (width, height) = hue.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        level((min..=max).contains(&hue.get_pixel(x, y).0[0]))
    })
}

/// Set every pixel whose value is strictly greater than `threshold`.
#[must_use]
pub fn above(plane: &FloatPlane, threshold: f32) -> GrayImage {
    let (width, height) = plane.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        level(plane.get_pixel(x, y).0[0] > threshold)
    })
}

/// Logical AND of two masks.
///
/// The result has the dimensions of `a`. Pixels of `a` with no
/// counterpart in `b` are treated as unset.
#[must_use]
pub fn intersect(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let (width, height) = a.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let in_a = a.get_pixel(x, y).0[0] != UNSET;
        let in_b = b
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] != UNSET);
        level(in_a && in_b)
    })
}

/// Morphological opening with a disk of the given radius.
///
/// Removes specks smaller than the disk. Radius 0 or an image without
/// pixels only normalizes.
#[must_use]
pub fn open(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 || has_no_pixels(mask) {
        return normalize(mask);
    }
    normalize(&grayscale_open(mask, &Mask::disk(radius)))
}

/// Morphological closing with a disk of the given radius.
///
/// Fills gaps narrower than the disk. Radius 0 or an image without
/// pixels only normalizes.
#[must_use]
pub fn close(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 || has_no_pixels(mask) {
        return normalize(mask);
    }
    normalize(&grayscale_close(mask, &Mask::disk(radius)))
}

// imageproc's morphology cannot handle a zero-width or zero-height image.
fn has_no_pixels(mask: &GrayImage) -> bool {
    mask.width() == 0 || mask.height() == 0
}

fn normalize(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        level(mask.get_pixel(x, y).0[0] != UNSET)
    })
}

/// Number of set pixels.
#[must_use]
pub fn count_set(mask: &GrayImage) -> u64 {
    mask.pixels().map(|p| u64::from(p.0[0] != UNSET)).sum()
}

/// `true` when no pixel is set.
#[must_use]
pub fn is_empty(mask: &GrayImage) -> bool {
    mask.pixels().all(|p| p.0[0] == UNSET)
}

/// Rasterize one closed contour as a filled mask.
///
/// Both the interior and every boundary point are set. Degenerate
/// contours (fewer than three points, or zero area) set only their
/// boundary points.
#[must_use]
pub fn fill_contour(dimensions: Dimensions, contour: &Contour) -> GrayImage {
    let mut mask = GrayImage::new(dimensions.width, dimensions.height);

    let mut polygon: Vec<imageproc::point::Point<i32>> =
        contour.points().iter().map(|&p| p.into()).collect();
    // The polygon filler rejects explicitly closed rings.
    if polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() >= 3 {
        draw_polygon_mut(&mut mask, &polygon, Luma([SET]));
    }

    for p in contour.points() {
        if let (Ok(x), Ok(y)) = (u32::try_from(p.x), u32::try_from(p.y))
            && x < dimensions.width
            && y < dimensions.height
        {
            mask.put_pixel(x, y, Luma([SET]));
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn square_mask(size: u32, lo: u32, hi: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            level((lo..hi).contains(&x) && (lo..hi).contains(&y))
        })
    }

    #[test]
    fn hue_band_is_inclusive() {
        let hue = GrayImage::from_fn(5, 1, |x, _| Luma([[9, 10, 20, 30, 31][x as usize]]));
        let mask = hue_in_range(&hue, 10, 30);
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 255, 255, 255, 0]);
    }

    #[test]
    fn inverted_hue_band_selects_nothing() {
        let hue = GrayImage::from_fn(8, 8, |x, y| Luma([u8::try_from(x * 8 + y).unwrap_or(0)]));
        assert!(is_empty(&hue_in_range(&hue, 50, 10)));
    }

    #[test]
    fn in_range_checks_every_channel() {
        let image = image::RgbImage::from_fn(3, 1, |x, _| match x {
            0 => image::Rgb([40, 160, 40]),   // green, saturated, bright
            1 => image::Rgb([150, 160, 150]), // green but washed out
            _ => image::Rgb([4, 16, 4]),      // green but dark
        });
        let planes = HsvPlanes::from_rgb(&image);
        let mask = in_range(&planes, [35, 50, 20], [85, 255, 255]);
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![255, 0, 0]);
    }

    #[test]
    fn opening_keeps_exactly_the_disk_footprint() {
        // A square just large enough to hold the disk shrinks to the disk.
        assert_eq!(count_set(&open(&square_mask(20, 8, 13), 2)), 13);
        assert_eq!(count_set(&open(&square_mask(20, 6, 13), 3)), 29);
        // Anything narrower than the disk disappears.
        assert!(is_empty(&open(&square_mask(20, 8, 12), 2)));
    }

    #[test]
    fn morphology_on_zero_sized_masks_is_a_no_op() {
        for (w, h) in [(0, 0), (0, 5), (5, 0)] {
            let empty = GrayImage::new(w, h);
            assert_eq!(open(&empty, 3).dimensions(), (w, h));
            assert_eq!(close(&empty, 3).dimensions(), (w, h));
        }
    }

    #[test]
    fn above_is_strict() {
        let plane = FloatPlane::from_fn(3, 1, |x, _| Luma([[9.0, 10.0, 11.0][x as usize]]));
        let values: Vec<u8> = above(&plane, 10.0).pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255]);
    }

    #[test]
    fn intersect_is_logical_and() {
        let a = square_mask(10, 0, 6);
        let b = square_mask(10, 4, 10);
        let both = intersect(&a, &b);
        assert_eq!(count_set(&both), 4);
        assert_eq!(both.get_pixel(5, 5).0[0], SET);
        assert_eq!(both.get_pixel(3, 3).0[0], UNSET);
    }

    #[test]
    fn intersect_treats_missing_pixels_as_unset() {
        let a = square_mask(10, 0, 10);
        let b = square_mask(5, 0, 5);
        let both = intersect(&a, &b);
        assert_eq!(both.dimensions(), (10, 10));
        assert_eq!(count_set(&both), 25);
    }

    #[test]
    fn open_removes_isolated_speck() {
        let mut mask = square_mask(30, 5, 20);
        mask.put_pixel(26, 26, Luma([SET]));
        let opened = open(&mask, 2);
        assert_eq!(opened.get_pixel(26, 26).0[0], UNSET);
        assert_eq!(opened.get_pixel(12, 12).0[0], SET);
    }

    #[test]
    fn close_fills_pinhole() {
        let mut mask = square_mask(30, 5, 25);
        mask.put_pixel(15, 15, Luma([UNSET]));
        let closed = close(&mask, 3);
        assert_eq!(closed.get_pixel(15, 15).0[0], SET);
    }

    #[test]
    fn zero_radius_only_normalizes() {
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(1, 1, Luma([7]));
        let opened = open(&mask, 0);
        assert_eq!(opened.get_pixel(1, 1).0[0], SET);
        assert_eq!(count_set(&opened), 1);
    }

    #[test]
    fn count_and_empty() {
        let empty = GrayImage::new(6, 6);
        assert!(is_empty(&empty));
        assert_eq!(count_set(&empty), 0);
        let full = square_mask(6, 0, 6);
        assert!(!is_empty(&full));
        assert_eq!(count_set(&full), 36);
    }

    #[test]
    fn fill_contour_sets_interior_and_boundary() {
        let contour = Contour::new(vec![
            Point::new(2, 2),
            Point::new(7, 2),
            Point::new(7, 7),
            Point::new(2, 7),
        ]);
        let mask = fill_contour(
            Dimensions {
                width: 10,
                height: 10,
            },
            &contour,
        );
        for (x, y) in [(4, 4), (3, 6), (2, 2), (7, 7)] {
            assert_eq!(mask.get_pixel(x, y).0[0], SET, "({x}, {y})");
        }
        for (x, y) in [(1, 1), (8, 4), (4, 8), (0, 9)] {
            assert_eq!(mask.get_pixel(x, y).0[0], UNSET, "({x}, {y})");
        }
    }

    #[test]
    fn fill_degenerate_contour_sets_points_only() {
        let contour = Contour::new(vec![Point::new(3, 3), Point::new(4, 3)]);
        let mask = fill_contour(
            Dimensions {
                width: 8,
                height: 8,
            },
            &contour,
        );
        assert_eq!(count_set(&mask), 2);
    }
}
