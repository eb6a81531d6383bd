//! Geometric primitives: points, axis-aligned rects and draggable markers

use serde::{Deserialize, Serialize};

use crate::CoordinateTransform;

/// A point in grid or screen space, depending on where it was constructed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn transform(&self, ct: &CoordinateTransform) -> Point {
        Point::new(ct.to_x(self.x), ct.to_y(self.y))
    }

    /// Chebyshev (max-coordinate) distance to `(x, y)`
    pub fn chebyshev(&self, x: f64, y: f64) -> f64 {
        (x - self.x).abs().max((y - self.y).abs())
    }
}

/// Axis-aligned box; `w`/`h` may be negative only transiently during a drag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Degenerate rect at a point
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    pub fn x1(&self) -> f64 {
        self.x + self.w
    }

    pub fn y1(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Minimal rect covering both `self` and `other`
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let x1 = self.x1().max(other.x1());
        let y0 = self.y.min(other.y);
        let y1 = self.y1().max(other.y1());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Minimal rect covering `self` and a single point
    pub fn union_point(&self, p: &Point) -> Rect {
        let x0 = self.x.min(p.x);
        let x1 = self.x1().max(p.x);
        let y0 = self.y.min(p.y);
        let y1 = self.y1().max(p.y);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x1() && y >= self.y && y < self.y1()
    }

    pub fn transform(&self, ct: &CoordinateTransform) -> Rect {
        Rect::new(
            ct.to_x(self.x),
            ct.to_y(self.y),
            self.w * ct.ax,
            self.h * ct.ay,
        )
    }

    /// Normalize an unordered cell drag into a positive-size rect covering
    /// both endpoints inclusively: a drag from (2,2) to (2,2) is a 1×1 rect.
    pub fn from_two_points(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect::new(
            x0.min(x1),
            y0.min(y1),
            (x0 - x1).abs() + 1.0,
            (y0 - y1).abs() + 1.0,
        )
    }
}

/// A draggable handle with a fixed screen-space hit radius
///
/// The radius is not scaled by the transform, so handles stay grabbable at
/// any zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    #[serde(default = "Marker::default_radius")]
    pub r: f64,
}

impl Marker {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            r: Self::default_radius(),
        }
    }

    fn default_radius() -> f64 {
        8.0
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn transform(&self, ct: &CoordinateTransform) -> Marker {
        Marker {
            x: ct.to_x(self.x),
            y: ct.to_y(self.y),
            r: self.r,
        }
    }

    /// Hit test against screen point `(x, y)` with `ct` mapping the marker's
    /// space to screen space
    pub fn is_hit(&self, ct: &CoordinateTransform, x: f64, y: f64) -> bool {
        let p = self.transform(ct);
        p.position().chebyshev(x, y) <= self.r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_two_points_degenerate_drag() {
        let r = Rect::from_two_points(2.0, 2.0, 2.0, 2.0);
        assert_eq!(r, Rect::new(2.0, 2.0, 1.0, 1.0));
    }

    #[test]
    fn test_from_two_points_normalizes() {
        let r = Rect::from_two_points(5.0, 1.0, 2.0, 4.0);
        assert_eq!(r, Rect::new(2.0, 1.0, 4.0, 4.0));
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, -1.0, 2.0, 2.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -1.0, 5.0, 3.0));
    }

    #[test]
    fn test_union_point_grows_box() {
        let a = Rect::new(1.0, 1.0, 1.0, 1.0);
        let grown = a.union_point(&Point::new(5.0, 0.0));
        assert_eq!(grown, Rect::new(1.0, 0.0, 4.0, 2.0));
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert!(r.contains(0.0, 0.0));
        assert!(r.contains(3.9, 3.9));
        assert!(!r.contains(4.0, 0.0));
        assert!(!r.contains(0.0, 4.0));
    }

    #[test]
    fn test_rect_transform() {
        let ct = CoordinateTransform::new(2.0, 10.0, 4.0, -8.0);
        let r = Rect::new(1.0, 2.0, 3.0, 4.0).transform(&ct);
        assert_eq!(r, Rect::new(12.0, 0.0, 6.0, 16.0));
    }

    #[test]
    fn test_marker_hit_chebyshev() {
        let ct = CoordinateTransform::new(10.0, 0.0, 10.0, 0.0);
        let m = Marker::new(2.0, 2.0); // screen (20, 20), r = 8
        assert!(m.is_hit(&ct, 28.0, 12.0));
        assert!(!m.is_hit(&ct, 28.5, 20.0));
        // Radius is screen-space: zooming in does not shrink the grab area
        let zoomed = CoordinateTransform::new(100.0, 0.0, 100.0, 0.0);
        assert!(m.is_hit(&zoomed, 208.0, 200.0));
    }
}
