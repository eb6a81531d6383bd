//! Projective (perspective) transforms between quadrilaterals
//!
//! A quad→quad solve via an 8×8 linear system, point mapping, and an
//! inverse-mapped bilinear warp with a transparent border. No external
//! vision library; four point pairs are all the rectification needs.

use blockpix_core::Point;
use image::RgbaImage;

const PIVOT_EPS: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomographyError {
    /// Collinear or coincident control points; the system is singular
    Degenerate,
}

impl std::fmt::Display for HomographyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HomographyError::Degenerate => write!(f, "degenerate quadrilateral"),
        }
    }
}

impl std::error::Error for HomographyError {}

/// A 3×3 projective transform, row-major
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    pub m: [[f64; 3]; 3],
}

impl Homography {
    /// Solve the homography mapping `src[i]` onto `dst[i]` for four point
    /// pairs. Degenerate configurations are rejected rather than producing a
    /// singular transform.
    pub fn quad_to_quad(src: &[Point; 4], dst: &[Point; 4]) -> Result<Self, HomographyError> {
        // Unknowns h00..h21 with h22 fixed to 1:
        //   dst.x * (h20*x + h21*y + 1) = h00*x + h01*y + h02
        //   dst.y * (h20*x + h21*y + 1) = h10*x + h11*y + h12
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = (src[i].x, src[i].y);
            let (u, v) = (dst[i].x, dst[i].y);
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
        }
        let h = solve_8x8(&mut a)?;
        Ok(Self {
            m: [
                [h[0], h[1], h[2]],
                [h[3], h[4], h[5]],
                [h[6], h[7], 1.0],
            ],
        })
    }

    /// Map a single point through the transform
    pub fn apply(&self, p: Point) -> Point {
        let m = &self.m;
        let w = m[2][0] * p.x + m[2][1] * p.y + m[2][2];
        Point::new(
            (m[0][0] * p.x + m[0][1] * p.y + m[0][2]) / w,
            (m[1][0] * p.x + m[1][1] * p.y + m[1][2]) / w,
        )
    }

    /// Map a slice of points
    pub fn apply_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&p| self.apply(p)).collect()
    }

    /// Inverse transform via the adjugate
    pub fn invert(&self) -> Result<Homography, HomographyError> {
        let m = &self.m;
        let (a, b, c) = (m[0][0], m[0][1], m[0][2]);
        let (d, e, f) = (m[1][0], m[1][1], m[1][2]);
        let (g, h, i) = (m[2][0], m[2][1], m[2][2]);

        let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
        if det.abs() < PIVOT_EPS {
            return Err(HomographyError::Degenerate);
        }
        let inv = 1.0 / det;
        Ok(Homography {
            m: [
                [
                    (e * i - f * h) * inv,
                    (c * h - b * i) * inv,
                    (b * f - c * e) * inv,
                ],
                [
                    (f * g - d * i) * inv,
                    (a * i - c * g) * inv,
                    (c * d - a * f) * inv,
                ],
                [
                    (d * h - e * g) * inv,
                    (b * g - a * h) * inv,
                    (a * e - b * d) * inv,
                ],
            ],
        })
    }
}

/// Gaussian elimination with partial pivoting on an 8×8 augmented system
fn solve_8x8(a: &mut [[f64; 9]; 8]) -> Result<[f64; 8], HomographyError> {
    for col in 0..8 {
        let pivot_row = (col..8)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < PIVOT_EPS {
            return Err(HomographyError::Degenerate);
        }
        a.swap(col, pivot_row);
        let pivot = a[col][col];
        for r in (col + 1)..8 {
            let factor = a[r][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in col..9 {
                a[r][c] -= factor * a[col][c];
            }
        }
    }
    let mut x = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut acc = a[row][8];
        for c in (row + 1)..8 {
            acc -= a[row][c] * x[c];
        }
        x[row] = acc / a[row][row];
    }
    Ok(x)
}

/// Warp `src` through `h` into a `width × height` image.
///
/// Each destination pixel is inverse-mapped into the source and sampled
/// bilinearly; samples outside the source contribute transparent black, so
/// the border fill is constant zero.
pub fn warp_perspective(
    src: &RgbaImage,
    h: &Homography,
    width: u32,
    height: u32,
) -> Result<RgbaImage, HomographyError> {
    let inv = h.invert()?;
    let mut dst = RgbaImage::new(width, height);

    let src_w = src.width() as i32;
    let src_h = src.height() as i32;
    let src_raw = src.as_raw();
    let src_stride = src_w as usize * 4;

    let sample = |sx: i32, sy: i32| -> [f64; 4] {
        if sx < 0 || sy < 0 || sx >= src_w || sy >= src_h {
            [0.0; 4]
        } else {
            let i = sy as usize * src_stride + sx as usize * 4;
            [
                src_raw[i] as f64,
                src_raw[i + 1] as f64,
                src_raw[i + 2] as f64,
                src_raw[i + 3] as f64,
            ]
        }
    };

    for dy in 0..height {
        for dx in 0..width {
            let p = Point::new(dx as f64, dy as f64);
            let m = &inv.m;
            let w = m[2][0] * p.x + m[2][1] * p.y + m[2][2];
            if w.abs() < 1e-12 {
                continue;
            }
            let sx = (m[0][0] * p.x + m[0][1] * p.y + m[0][2]) / w;
            let sy = (m[1][0] * p.x + m[1][1] * p.y + m[1][2]) / w;

            let x0 = sx.floor() as i32;
            let y0 = sy.floor() as i32;
            if x0 < -1 || y0 < -1 || x0 >= src_w || y0 >= src_h {
                continue;
            }
            let fx = sx - x0 as f64;
            let fy = sy - y0 as f64;

            let tl = sample(x0, y0);
            let tr = sample(x0 + 1, y0);
            let bl = sample(x0, y0 + 1);
            let br = sample(x0 + 1, y0 + 1);

            let px = dst.get_pixel_mut(dx, dy);
            for c in 0..4 {
                let top = tl[c] + (tr[c] - tl[c]) * fx;
                let bot = bl[c] + (br[c] - bl[c]) * fx;
                px.0[c] = (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn quad(pts: [(f64, f64); 4]) -> [Point; 4] {
        [
            Point::new(pts[0].0, pts[0].1),
            Point::new(pts[1].0, pts[1].1),
            Point::new(pts[2].0, pts[2].1),
            Point::new(pts[3].0, pts[3].1),
        ]
    }

    #[test]
    fn test_identity_solve() {
        let q = quad([(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let h = Homography::quad_to_quad(&q, &q).unwrap();
        for &p in &q {
            let mapped = h.apply(p);
            assert!((mapped.x - p.x).abs() < 1e-9);
            assert!((mapped.y - p.y).abs() < 1e-9);
        }
        let mid = h.apply(Point::new(5.0, 5.0));
        assert!((mid.x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_maps_corners_exactly() {
        let src = quad([(3.0, 1.0), (2.0, 9.0), (11.0, 10.0), (12.0, 2.0)]);
        let dst = quad([(0.0, 0.0), (0.0, 8.0), (8.0, 8.0), (8.0, 0.0)]);
        let h = Homography::quad_to_quad(&src, &dst).unwrap();
        for i in 0..4 {
            let p = h.apply(src[i]);
            assert!((p.x - dst[i].x).abs() < 1e-6, "corner {}", i);
            assert!((p.y - dst[i].y).abs() < 1e-6, "corner {}", i);
        }
    }

    #[test]
    fn test_invert_round_trips() {
        let src = quad([(0.0, 0.0), (1.0, 8.0), (9.0, 9.0), (8.0, -1.0)]);
        let dst = quad([(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        let h = Homography::quad_to_quad(&src, &dst).unwrap();
        let inv = h.invert().unwrap();
        let p = Point::new(3.3, 2.2);
        let back = inv.apply(h.apply(p));
        assert!((back.x - p.x).abs() < 1e-8);
        assert!((back.y - p.y).abs() < 1e-8);
    }

    #[test]
    fn test_degenerate_quad_rejected() {
        // All four source points on one line
        let src = quad([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let dst = quad([(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        assert_eq!(
            Homography::quad_to_quad(&src, &dst),
            Err(HomographyError::Degenerate)
        );
        // Coincident corners
        let src = quad([(0.0, 0.0), (0.0, 0.0), (1.0, 1.0), (1.0, 0.0)]);
        assert_eq!(
            Homography::quad_to_quad(&src, &dst),
            Err(HomographyError::Degenerate)
        );
    }

    #[test]
    fn test_identity_warp_preserves_pixels() {
        let mut src = RgbaImage::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                src.put_pixel(x, y, Rgba([x as u8 * 30, y as u8 * 30, 7, 255]));
            }
        }
        let q = quad([(0.0, 0.0), (0.0, 8.0), (8.0, 8.0), (8.0, 0.0)]);
        let h = Homography::quad_to_quad(&q, &q).unwrap();
        let out = warp_perspective(&src, &h, 8, 8).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_translation_warp() {
        let mut src = RgbaImage::new(4, 4);
        src.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let from = quad([(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        let to = quad([(2.0, 1.0), (2.0, 5.0), (6.0, 5.0), (6.0, 1.0)]);
        let h = Homography::quad_to_quad(&from, &to).unwrap();
        let out = warp_perspective(&src, &h, 8, 8).unwrap();
        assert_eq!(*out.get_pixel(2, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }
}
