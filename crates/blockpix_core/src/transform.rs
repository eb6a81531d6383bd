//! Affine transform between block-grid space and screen space

use serde::{Deserialize, Serialize};

use crate::Rect;

/// Serialized form of a [`CoordinateTransform`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTransformState {
    pub ax: f64,
    pub bx: f64,
    pub ay: f64,
    pub by: f64,
}

/// Affine map between grid space and screen space
///
/// Screen coordinate = grid coordinate * `a` + `b`, per axis. Each owner
/// (block buffer view, reference-picture source view, destination view)
/// holds its own instance; transforms are never shared.
///
/// Invariant: `ax` and `ay` stay nonzero so the inverse mapping is defined.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTransform {
    pub ax: f64,
    pub bx: f64,
    pub ay: f64,
    pub by: f64,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::new(16.0, 0.0, 16.0, 0.0)
    }
}

impl CoordinateTransform {
    pub fn new(ax: f64, bx: f64, ay: f64, by: f64) -> Self {
        Self { ax, bx, ay, by }
    }

    /// Uniform scale with no offset
    pub fn with_scale(scale: f64) -> Self {
        Self::new(scale, 0.0, scale, 0.0)
    }

    /// Grid x to screen x
    pub fn to_x(&self, x: f64) -> f64 {
        self.ax * x + self.bx
    }

    /// Grid y to screen y
    pub fn to_y(&self, y: f64) -> f64 {
        self.ay * y + self.by
    }

    /// Screen x to the containing grid column (truncates toward the cell,
    /// never rounds to nearest)
    pub fn from_x(&self, sx: f64) -> i32 {
        ((sx - self.bx) / self.ax).floor() as i32
    }

    /// Screen y to the containing grid row
    pub fn from_y(&self, sy: f64) -> i32 {
        ((sy - self.by) / self.ay).floor() as i32
    }

    /// Compose with an inner transform: `outer.join(inner)` applies `inner`
    /// first, then `outer`. Used to render a picture with its own internal
    /// scale nested inside the global view.
    pub fn join(&self, inner: &CoordinateTransform) -> CoordinateTransform {
        CoordinateTransform::new(
            self.ax * inner.ax,
            self.ax * inner.bx + self.bx,
            self.ay * inner.ay,
            self.ay * inner.by + self.by,
        )
    }

    /// Rescale by `factor`, keeping screen point `(cx, cy)` fixed so zooming
    /// under the cursor does not shift the pointed-at content
    pub fn zoom(&mut self, factor: f64, cx: f64, cy: f64) {
        self.bx = (1.0 - factor) * cx + factor * self.bx;
        self.by = (1.0 - factor) * cy + factor * self.by;
        self.ax *= factor;
        self.ay *= factor;
    }

    /// Translate by a screen-space delta; reports whether anything moved
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        self.bx += dx;
        self.by += dy;
        dx != 0.0 || dy != 0.0
    }

    /// Rescale and recenter so that `source`'s extent fits inside `dest`.
    ///
    /// Uses the smaller of the two axis ratios so the aspect ratio is
    /// preserved and nothing is cropped, applies the safety `margin`
    /// (0.96 by default via [`view_area`](Self::view_area)), and aligns the
    /// centers of `source` and `dest`. No-op when `source` is absent or has
    /// no positive extent.
    pub fn view_area_with_margin(&mut self, source: Option<&Rect>, dest: &Rect, margin: f64) {
        let Some(source) = source else { return };
        if source.w <= 0.0 || dest.w <= 0.0 {
            return;
        }
        let r = (dest.w / source.w).min(dest.h / source.h) * margin;
        self.ax *= r;
        self.ay *= r;
        let c1 = source.center();
        let c2 = dest.center();
        self.bx = c2.x - r * (c1.x - self.bx);
        self.by = c2.y - r * (c1.y - self.by);
    }

    /// [`view_area_with_margin`](Self::view_area_with_margin) with the
    /// standard 0.96 margin
    pub fn view_area(&mut self, source: Option<&Rect>, dest: &Rect) {
        self.view_area_with_margin(source, dest, 0.96);
    }

    pub fn save(&self) -> CoordinateTransformState {
        CoordinateTransformState {
            ax: self.ax,
            bx: self.bx,
            ay: self.ay,
            by: self.by,
        }
    }

    pub fn load(&mut self, s: &CoordinateTransformState) {
        self.ax = s.ax;
        self.bx = s.bx;
        self.ay = s.ay;
        self.by = s.by;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_floor() {
        let ct = CoordinateTransform::new(16.0, 5.0, 16.0, -3.0);
        for gx in -20..20 {
            let sx = ct.to_x(gx as f64);
            assert_eq!(ct.from_x(sx), gx);
            // Anywhere inside the cell maps back to the same column
            assert_eq!(ct.from_x(sx + 0.999 * ct.ax.abs()), gx);
        }
    }

    #[test]
    fn test_join_applies_inner_first() {
        let outer = CoordinateTransform::new(2.0, 10.0, 2.0, 20.0);
        let inner = CoordinateTransform::new(0.5, 3.0, 0.25, 7.0);
        let joined = outer.join(&inner);
        let x = 4.0;
        let y = 8.0;
        assert_eq!(joined.to_x(x), outer.to_x(inner.to_x(x)));
        assert_eq!(joined.to_y(y), outer.to_y(inner.to_y(y)));
    }

    #[test]
    fn test_zoom_keeps_cursor_fixed() {
        let mut ct = CoordinateTransform::new(16.0, 40.0, 16.0, -12.0);
        let (cx, cy) = (123.0, 77.0);
        // The grid point currently under the cursor
        let gx = (cx - ct.bx) / ct.ax;
        let gy = (cy - ct.by) / ct.ay;
        ct.zoom(2.0, cx, cy);
        assert!((ct.to_x(gx) - cx).abs() < 1e-9);
        assert!((ct.to_y(gy) - cy).abs() < 1e-9);
        assert_eq!(ct.ax, 32.0);
    }

    #[test]
    fn test_pan_reports_movement() {
        let mut ct = CoordinateTransform::default();
        assert!(!ct.pan(0.0, 0.0));
        assert!(ct.pan(3.0, 0.0));
        assert!(ct.pan(0.0, -2.0));
        assert_eq!(ct.bx, 3.0);
        assert_eq!(ct.by, -2.0);
    }

    #[test]
    fn test_view_area_fits_and_centers() {
        let mut ct = CoordinateTransform::new(1.0, 0.0, 1.0, 0.0);
        let source = Rect::new(0.0, 0.0, 100.0, 50.0);
        let dest = Rect::new(0.0, 0.0, 200.0, 200.0);
        ct.view_area_with_margin(Some(&source), &dest, 1.0);
        // Width is the binding axis: 200/100 = 2
        assert!((ct.ax - 2.0).abs() < 1e-9);
        // Source center lands on dest center
        let c = source.center();
        assert!((ct.to_x(c.x) - 100.0).abs() < 1e-9);
        assert!((ct.to_y(c.y) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_area_no_op_on_empty_source() {
        let mut ct = CoordinateTransform::default();
        let before = ct.clone();
        ct.view_area(None, &Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(ct, before);
        ct.view_area(
            Some(&Rect::new(0.0, 0.0, 0.0, 10.0)),
            &Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        assert_eq!(ct, before);
    }

    #[test]
    fn test_state_round_trip() {
        let ct = CoordinateTransform::new(2.5, -4.0, 3.5, 9.0);
        let mut other = CoordinateTransform::default();
        other.load(&ct.save());
        assert_eq!(other, ct);
    }
}
