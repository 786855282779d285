//! Planar geometry on integer pixel contours.
//!
//! Everything here is pure arithmetic on point lists: polygon area,
//! closed arc length, pixel bounding boxes, and the minimum enclosing
//! circle.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Axis-aligned bounding box in inclusive pixel extents.
///
/// A single pixel has `width == height == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRect {
    /// Leftmost column.
    pub x: i32,
    /// Topmost row.
    pub y: i32,
    /// `max_x - min_x + 1`.
    pub width: u32,
    /// `max_y - min_y + 1`.
    pub height: u32,
}

impl BoundingRect {
    /// Width divided by height. Zero when the box is empty.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        f64::from(self.width) / f64::from(self.height)
    }
}

/// A circle in continuous image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center column.
    pub x: f64,
    /// Center row.
    pub y: f64,
    /// Radius in pixels.
    pub radius: f64,
}

/// Tolerance for "point lies on or inside a circle".
const CONTAINS_EPSILON: f64 = 1e-7;

impl Circle {
    const fn point(x: f64, y: f64) -> Self {
        Self { x, y, radius: 0.0 }
    }

    fn diameter(a: (f64, f64), b: (f64, f64)) -> Self {
        let x = (a.0 + b.0) / 2.0;
        let y = (a.1 + b.1) / 2.0;
        Self {
            x,
            y,
            radius: (a.0 - x).hypot(a.1 - y),
        }
    }

    /// Circle through three points, or the widest diameter circle when
    /// they are collinear.
    fn circumscribed(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Self {
        let (bx, by) = (b.0 - a.0, b.1 - a.1);
        let (cx, cy) = (c.0 - a.0, c.1 - a.1);
        let d = 2.0 * bx.mul_add(cy, -(by * cx));
        if d.abs() < f64::EPSILON {
            return [Self::diameter(a, b), Self::diameter(a, c), Self::diameter(b, c)]
                .into_iter()
                .fold(Self::point(a.0, a.1), |best, circle| {
                    if circle.radius > best.radius {
                        circle
                    } else {
                        best
                    }
                });
        }
        let b2 = bx.mul_add(bx, by * by);
        let c2 = cx.mul_add(cx, cy * cy);
        let ux = cy.mul_add(b2, -(by * c2)) / d;
        let uy = bx.mul_add(c2, -(cx * b2)) / d;
        Self {
            x: a.0 + ux,
            y: a.1 + uy,
            radius: ux.hypot(uy),
        }
    }

    /// `true` when `(x, y)` lies inside or on the circle.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.x).hypot(y - self.y) <= self.radius + CONTAINS_EPSILON * self.radius.max(1.0)
    }
}

/// Absolute polygon area by the shoelace formula.
///
/// The polygon is implicitly closed. Fewer than three points enclose
/// no area.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let twice = twice.unsigned_abs() as f64;
    twice / 2.0
}

/// Length of the closed polyline through `points`, including the
/// segment from the last point back to the first.
#[must_use]
pub fn closed_arc_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(&a, &b)| a.distance(b))
        .sum()
}

/// Inclusive pixel bounding box, or `None` for an empty point list.
#[must_use]
pub fn bounding_rect(points: &[Point]) -> Option<BoundingRect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingRect {
        x: min_x,
        y: min_y,
        width: max_x.abs_diff(min_x) + 1,
        height: max_y.abs_diff(min_y) + 1,
    })
}

/// Smallest circle containing every point, or `None` for an empty list.
///
/// Only convex hull vertices can touch the minimum enclosing circle, so
/// the incremental construction runs over the hull.
#[must_use]
pub fn minimum_enclosing_circle(points: &[Point]) -> Option<Circle> {
    if points.is_empty() {
        return None;
    }

    let raw: Vec<imageproc::point::Point<i32>> = points.iter().map(|&p| p.into()).collect();
    let hull = imageproc::geometry::convex_hull(raw.as_slice());
    let vertices = if hull.is_empty() { &raw } else { &hull };
    let hull: Vec<(f64, f64)> = vertices
        .iter()
        .map(|p| (f64::from(p.x), f64::from(p.y)))
        .collect();

    let mut circle = Circle::point(hull[0].0, hull[0].1);
    for i in 1..hull.len() {
        let pi = hull[i];
        if circle.contains(pi.0, pi.1) {
            continue;
        }
        circle = Circle::point(pi.0, pi.1);
        for j in 0..i {
            let pj = hull[j];
            if circle.contains(pj.0, pj.1) {
                continue;
            }
            circle = Circle::diameter(pi, pj);
            for &pk in &hull[..j] {
                if !circle.contains(pk.0, pk.1) {
                    circle = Circle::circumscribed(pi, pj, pk);
                }
            }
        }
    }
    Some(circle)
}
