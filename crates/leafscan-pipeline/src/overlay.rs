//! Annotated previews: leaf outline and lesion markers drawn on copies
//! of the source image.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

use crate::contour::Contour;

/// Leaf outline color.
pub const LEAF_OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Leaf outline stroke width in pixels.
pub const LEAF_OUTLINE_THICKNESS: u32 = 3;

/// Lesion marker color.
pub const LESION_MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Lesion marker stroke width in pixels.
pub const LESION_MARKER_THICKNESS: u32 = 2;

/// Smallest marker radius, so tiny lesions stay visible.
pub const MIN_MARKER_RADIUS: i32 = 5;

/// Copy of `image` with `contour` traced in [`LEAF_OUTLINE_COLOR`].
#[must_use]
pub fn leaf_outline(image: &RgbImage, contour: &Contour) -> RgbImage {
    let mut canvas = image.clone();
    draw_leaf_outline_mut(&mut canvas, contour);
    canvas
}

/// Stamp a thick stroke along every boundary point.
///
/// Traced contours are 8-connected, so stamping a disk at each point
/// yields a continuous band.
pub fn draw_leaf_outline_mut(canvas: &mut RgbImage, contour: &Contour) {
    let half = i32::try_from(LEAF_OUTLINE_THICKNESS / 2).unwrap_or(1);
    for p in contour.points() {
        draw_filled_circle_mut(canvas, (p.x, p.y), half, LEAF_OUTLINE_COLOR);
    }
}

/// Copy of `image` with a marker around each lesion.
#[must_use]
pub fn lesion_markers(image: &RgbImage, lesions: &[Contour]) -> RgbImage {
    let mut canvas = image.clone();
    draw_lesion_markers_mut(&mut canvas, lesions);
    canvas
}

/// Draw a hollow circle at each lesion's minimum enclosing circle.
///
/// The center and radius are truncated to whole pixels and the radius
/// is floored at [`MIN_MARKER_RADIUS`].
pub fn draw_lesion_markers_mut(canvas: &mut RgbImage, lesions: &[Contour]) {
    for lesion in lesions {
        let Some((center, radius)) = marker_geometry(lesion) else {
            continue;
        };
        for ring in 0..LESION_MARKER_THICKNESS {
            let offset = i32::try_from(ring).unwrap_or(0);
            draw_hollow_circle_mut(canvas, center, radius + offset, LESION_MARKER_COLOR);
        }
    }
}

/// Integer marker center and radius for one lesion.
#[must_use]
pub fn marker_geometry(lesion: &Contour) -> Option<((i32, i32), i32)> {
    let circle = lesion.enclosing_circle()?;
    #[allow(clippy::cast_possible_truncation)]
    let (x, y, r) = (circle.x as i32, circle.y as i32, circle.radius as i32);
    Some(((x, y), r.max(MIN_MARKER_RADIUS)))
}

/// Lesion markers drawn over an existing overlay (usually the leaf
/// outline) for a combined preview.
#[must_use]
pub fn compose(leaf_overlay: &RgbImage, lesions: &[Contour]) -> RgbImage {
    lesion_markers(leaf_overlay, lesions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn white(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    fn square(lo: i32, hi: i32) -> Contour {
        let mut points = Vec::new();
        for x in lo..hi {
            points.push(Point::new(x, lo));
        }
        for y in lo..hi {
            points.push(Point::new(hi, y));
        }
        for x in (lo + 1..=hi).rev() {
            points.push(Point::new(x, hi));
        }
        for y in (lo + 1..=hi).rev() {
            points.push(Point::new(lo, y));
        }
        Contour::new(points)
    }

    #[test]
    fn outline_is_green_and_thick() {
        let image = white(40, 40);
        let out = leaf_outline(&image, &square(10, 30));
        assert_eq!(*out.get_pixel(20, 10), LEAF_OUTLINE_COLOR);
        assert_eq!(*out.get_pixel(20, 9), LEAF_OUTLINE_COLOR);
        assert_eq!(*out.get_pixel(20, 11), LEAF_OUTLINE_COLOR);
        assert_eq!(*out.get_pixel(20, 20), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(20, 10), Rgb([255, 255, 255]));
    }

    #[test]
    fn small_lesion_marker_uses_minimum_radius() {
        let lesion = Contour::new(vec![Point::new(20, 20), Point::new(21, 20)]);
        let ((cx, cy), r) = marker_geometry(&lesion).unwrap_or(((0, 0), 0));
        assert_eq!((cx, cy, r), (20, 20, MIN_MARKER_RADIUS));
    }

    #[test]
    fn lesion_marker_is_red_ring() {
        let image = white(60, 60);
        let out = lesion_markers(&image, &[square(25, 35)]);
        // Enclosing circle center (30, 30), radius ~7.07 -> 7.
        assert_eq!(*out.get_pixel(37, 30), LESION_MARKER_COLOR);
        assert_eq!(*out.get_pixel(38, 30), LESION_MARKER_COLOR);
        assert_eq!(*out.get_pixel(30, 30), Rgb([255, 255, 255]));
    }

    #[test]
    fn no_lesions_leaves_copy_unchanged() {
        let image = white(10, 10);
        assert_eq!(lesion_markers(&image, &[]), image);
    }

    #[test]
    fn compose_keeps_outline_and_adds_markers() {
        let image = white(60, 60);
        let leaf = leaf_outline(&image, &square(5, 55));
        let both = compose(&leaf, &[square(25, 35)]);
        assert_eq!(*both.get_pixel(30, 5), LEAF_OUTLINE_COLOR);
        assert_eq!(*both.get_pixel(37, 30), LESION_MARKER_COLOR);
    }
}
