//! Contours: traced outer boundaries of connected mask regions.
//!
//! Border following is Suzuki-Abe via `imageproc::contours::find_contours`.
//! Only top-level outer borders are kept; holes and anything nested inside
//! a hole are dropped, so a ring-shaped region yields one contour.

use image::GrayImage;
use imageproc::contours::BorderType;
use serde::{Deserialize, Serialize};

use crate::geometry::{self, BoundingRect, Circle};
use crate::types::Point;

/// An ordered, implicitly closed boundary of one connected region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    /// Wrap an ordered list of boundary points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Boundary points in traversal order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of boundary points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area (shoelace formula over the boundary points).
    #[must_use]
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.points)
    }

    /// Closed arc length.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        geometry::closed_arc_length(&self.points)
    }

    /// Inclusive pixel bounding box.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<BoundingRect> {
        geometry::bounding_rect(&self.points)
    }

    /// Bounding box width divided by height, 0 for an empty contour.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.bounding_rect().map_or(0.0, |r| r.aspect_ratio())
    }

    /// `4π·area / perimeter²`: 1 for a circle, lower for elongated or
    /// ragged shapes. `None` when the perimeter is zero.
    ///
    /// Pixel discretization can push small shapes slightly above 1.
    #[must_use]
    pub fn circularity(&self) -> Option<f64> {
        let perimeter = self.perimeter();
        if perimeter > 0.0 {
            Some(4.0 * std::f64::consts::PI * self.area() / (perimeter * perimeter))
        } else {
            None
        }
    }

    /// Minimum enclosing circle.
    #[must_use]
    pub fn enclosing_circle(&self) -> Option<Circle> {
        geometry::minimum_enclosing_circle(&self.points)
    }
}

/// Trace the outer boundary of every top-level region in `mask`.
///
/// Any nonzero pixel is foreground.
#[must_use]
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    let contours: Vec<imageproc::contours::Contour<i32>> =
        imageproc::contours::find_contours(mask);

    contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(c.points.into_iter().map(Point::from).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    use super::*;

    #[allow(clippy::cast_possible_truncation)]
    fn circle_points(radius: f64, n: u32) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let t = f64::from(i) / f64::from(n) * std::f64::consts::TAU;
                Point::new(
                    (radius * t.cos()).round() as i32 + 200,
                    (radius * t.sin()).round() as i32 + 200,
                )
            })
            .collect()
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert!(find_external_contours(&GrayImage::new(20, 20)).is_empty());
    }

    #[test]
    fn filled_rectangle_gives_one_contour() {
        let mut mask = GrayImage::new(40, 40);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 10).of_size(20, 10), Luma([255]));
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let rect = contours[0].bounding_rect();
        assert_eq!(
            rect,
            Some(BoundingRect {
                x: 5,
                y: 10,
                width: 20,
                height: 10
            })
        );
        assert!((contours[0].aspect_ratio() - 2.0).abs() < 1e-9);
        // Boundary pixel centers enclose (w-1) x (h-1).
        assert!((contours[0].area() - 19.0 * 9.0).abs() < 1e-9);
    }

    #[test]
    fn holes_and_islands_are_ignored() {
        let mut mask = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 5).of_size(50, 50), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(15, 15).of_size(30, 30), Luma([0]));
        draw_filled_rect_mut(&mut mask, Rect::at(25, 25).of_size(10, 10), Luma([255]));
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1, "only the outer ring should remain");
        assert_eq!(contours[0].bounding_rect().map(|r| r.width), Some(50));
    }

    #[test]
    fn separate_blobs_give_separate_contours() {
        let mut mask = GrayImage::new(80, 40);
        draw_filled_circle_mut(&mut mask, (15, 20), 8, Luma([255]));
        draw_filled_circle_mut(&mut mask, (60, 20), 8, Luma([255]));
        assert_eq!(find_external_contours(&mask).len(), 2);
    }

    #[test]
    fn perfect_circle_has_unit_circularity() {
        let contour = Contour::new(circle_points(100.0, 90));
        let c = contour.circularity().unwrap_or_default();
        assert!((c - 1.0).abs() < 0.05, "circularity {c}");
    }

    #[test]
    fn elongated_shape_has_low_circularity() {
        let contour = Contour::new(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 4),
            Point::new(0, 4),
        ]);
        assert!(contour.circularity().unwrap_or_default() < 0.2);
    }

    #[test]
    fn single_point_has_no_circularity() {
        let contour = Contour::new(vec![Point::new(1, 1)]);
        assert!(contour.circularity().is_none());
        assert!(contour.area().abs() < f64::EPSILON);
    }

    #[test]
    fn enclosing_circle_of_traced_disk() {
        let mut mask = GrayImage::new(60, 60);
        draw_filled_circle_mut(&mut mask, (30, 30), 12, Luma([255]));
        let contours = find_external_contours(&mask);
        let circle = contours[0].enclosing_circle().unwrap_or(Circle {
            x: 0.0,
            y: 0.0,
            radius: 0.0,
        });
        assert!((circle.x - 30.0).abs() < 1.0);
        assert!((circle.y - 30.0).abs() < 1.0);
        assert!((circle.radius - 12.0).abs() < 1.0);
    }
}
