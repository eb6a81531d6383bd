//! Reference picture with perspective rectification
//!
//! State machine over a single bitmap: load seeds a corner quadrilateral,
//! the user drags the corners over the photographed object, and
//! [`ReferencePicture::set_perspective`] rectifies the quad onto a target
//! placement rectangle in grid space. The warp output is sized so that no
//! source content is ever clipped, and the destination view transform is
//! derived so the rectified sub-rect lands exactly on the target.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use blockpix_core::{
    CoordinateTransform, DisplayVariant, Marker, Point, Rect, ReferencePictureState,
};
use image::RgbaImage;
use log::warn;

use crate::homography::{warp_perspective, Homography, HomographyError};

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerspectiveError {
    /// No source bitmap loaded
    NoImage,
    /// No corner quadrilateral present
    NoQuad,
    /// No warped bitmap computed yet
    NoWarped,
    /// Collinear or self-degenerate quadrilateral
    Degenerate,
    /// Picture bytes could not be decoded
    Decode(String),
    /// Picture could not be encoded for persistence
    Encode(String),
}

impl std::fmt::Display for PerspectiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerspectiveError::NoImage => write!(f, "no source image loaded"),
            PerspectiveError::NoQuad => write!(f, "no quadrilateral present"),
            PerspectiveError::NoWarped => write!(f, "no warped image computed"),
            PerspectiveError::Degenerate => write!(f, "degenerate quadrilateral"),
            PerspectiveError::Decode(e) => write!(f, "picture decode error: {}", e),
            PerspectiveError::Encode(e) => write!(f, "picture encode error: {}", e),
        }
    }
}

impl std::error::Error for PerspectiveError {}

impl From<HomographyError> for PerspectiveError {
    fn from(_: HomographyError) -> Self {
        PerspectiveError::Degenerate
    }
}

/// The reference photo, its correction quadrilateral and both renditions
#[derive(Debug, Clone)]
pub struct ReferencePicture {
    src_img: Option<RgbaImage>,
    dst_img: Option<RgbaImage>,
    /// Corner markers in source-image space, ordered top-left, bottom-left,
    /// bottom-right, top-right
    quad: Option<[Marker; 4]>,
    pub show_picture: bool,
    pub show_frame: bool,
    pub show_only_in_frame: bool,
    pub displayed_variant: DisplayVariant,
    /// Source-image space → grid space
    pub src_ct: CoordinateTransform,
    /// Warped-image space → grid space
    pub dst_ct: CoordinateTransform,
    /// Crop/placement rect of the rectified region inside the warped bitmap
    pub warped_rect: Option<Rect>,
    grabbing: Option<usize>,
}

impl Default for ReferencePicture {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferencePicture {
    pub fn new() -> Self {
        Self {
            src_img: None,
            dst_img: None,
            quad: None,
            show_picture: true,
            show_frame: true,
            show_only_in_frame: false,
            displayed_variant: DisplayVariant::Src,
            src_ct: CoordinateTransform::with_scale(1.0 / 16.0),
            dst_ct: CoordinateTransform::with_scale(1.0 / 16.0),
            warped_rect: None,
            grabbing: None,
        }
    }

    pub fn source(&self) -> Option<&RgbaImage> {
        self.src_img.as_ref()
    }

    pub fn warped(&self) -> Option<&RgbaImage> {
        self.dst_img.as_ref()
    }

    pub fn quad(&self) -> Option<&[Marker; 4]> {
        self.quad.as_ref()
    }

    pub fn has_picture(&self) -> bool {
        self.src_img.is_some()
    }

    /// Install a freshly loaded picture: replaces both bitmaps, seeds the
    /// quadrilateral at the bitmap corners and resets the source view
    pub fn load_picture(&mut self, img: RgbaImage) {
        let w = img.width() as f64;
        let h = img.height() as f64;
        self.dst_img = None;
        self.warped_rect = None;
        self.src_img = Some(img);
        self.quad = Some([
            Marker::new(0.0, 0.0),
            Marker::new(0.0, h),
            Marker::new(w, h),
            Marker::new(w, 0.0),
        ]);
        self.src_ct = CoordinateTransform::with_scale(1.0 / 16.0);
        self.show_picture = true;
        self.show_only_in_frame = false;
        self.displayed_variant = DisplayVariant::Src;
    }

    /// Re-install a picture restored from the session store, keeping the
    /// persisted quadrilateral, and re-derive the warp when one was saved
    pub fn restore_picture(&mut self, img: RgbaImage) -> Result<(), PerspectiveError> {
        self.dst_img = None;
        self.src_img = Some(img);
        if self.quad.is_some() {
            if let Some(wr) = self.warped_rect {
                let target = wr.transform(&self.dst_ct);
                self.set_perspective(&target)?;
            }
        }
        Ok(())
    }

    /// Drop the picture and everything derived from it
    pub fn clear_picture(&mut self) {
        self.src_img = None;
        self.dst_img = None;
        self.quad = None;
        self.warped_rect = None;
        self.grabbing = None;
    }

    /// Index of the corner marker under screen point `(x, y)`, if any
    pub fn hit_test(&self, view: &CoordinateTransform, x: f64, y: f64) -> Option<usize> {
        let ct = view.join(&self.src_ct);
        let quad = self.quad.as_ref()?;
        (0..4).find(|&i| quad[i].is_hit(&ct, x, y))
    }

    /// Begin a corner drag if the press landed on a marker; reports whether
    /// a marker was grabbed
    pub fn pointer_down(&mut self, view: &CoordinateTransform, x: f64, y: f64) -> bool {
        self.grabbing = self.hit_test(view, x, y);
        self.grabbing.is_some()
    }

    pub fn is_grabbing(&self) -> bool {
        self.grabbing.is_some()
    }

    /// Move the grabbed corner by a screen-space delta; reports whether
    /// anything moved
    pub fn pointer_move(&mut self, view: &CoordinateTransform, dx: f64, dy: f64) -> bool {
        let (Some(i), Some(quad)) = (self.grabbing, self.quad.as_mut()) else {
            return false;
        };
        quad[i].x += dx / (self.src_ct.ax * view.ax);
        quad[i].y += dy / (self.src_ct.ay * view.ay);
        true
    }

    /// End a corner drag; reports whether a drag was in progress (the caller
    /// persists state when it was)
    pub fn pointer_up(&mut self) -> bool {
        self.grabbing.take().is_some()
    }

    /// Rectify the quadrilateral onto `target` (grid space).
    ///
    /// The warp is sized to the mapped extent of the whole source bitmap, so
    /// content outside the quad survives; `warped_rect` records where the
    /// rectified region sits inside that output, and the destination view
    /// transform maps it exactly onto `target`.
    pub fn set_perspective(&mut self, target: &Rect) -> Result<(), PerspectiveError> {
        let quad = self.quad.as_ref().ok_or(PerspectiveError::NoQuad)?;
        let src_img = self.src_img.as_ref().ok_or(PerspectiveError::NoImage)?;
        let src_pts = [
            quad[0].position(),
            quad[1].position(),
            quad[2].position(),
            quad[3].position(),
        ];

        // Bounding rect of the quadrilateral in source space
        let mut r_dst = Rect::at(src_pts[0].x, src_pts[0].y);
        for p in &src_pts[1..] {
            r_dst = r_dst.union_point(p);
        }

        // Where the whole source bitmap lands under quad → r_dst corners
        let h1 = Homography::quad_to_quad(&src_pts, &rect_corners(&r_dst, 0.0, 0.0))?;
        let w = src_img.width() as f64;
        let h = src_img.height() as f64;
        let bitmap_corners = [
            Point::new(0.0, 0.0),
            Point::new(0.0, h),
            Point::new(w, 0.0),
            Point::new(w, h),
        ];
        let mapped = h1.apply_all(&bitmap_corners);
        let mut r_dst2 = Rect::at(mapped[0].x, mapped[0].y);
        for p in &mapped[1..] {
            r_dst2 = r_dst2.union_point(p);
        }

        // Re-solve with the output shifted to start at (0, 0) so nothing is
        // clipped by the warp
        let h2 = Homography::quad_to_quad(&src_pts, &rect_corners(&r_dst, -r_dst2.x, -r_dst2.y))?;
        let out_w = (r_dst2.w.ceil() as u32).max(1);
        let out_h = (r_dst2.h.ceil() as u32).max(1);
        self.dst_img = Some(warp_perspective(src_img, &h2, out_w, out_h)?);

        // Place the rectified sub-rect onto the target placement rect
        self.dst_ct.ax = target.w / r_dst.w;
        self.dst_ct.bx = target.x - (r_dst.x - r_dst2.x) * self.dst_ct.ax;
        self.dst_ct.ay = target.h / r_dst.h;
        self.dst_ct.by = target.y - (r_dst.y - r_dst2.y) * self.dst_ct.ay;

        self.warped_rect = Some(Rect::new(
            r_dst.x - r_dst2.x,
            r_dst.y - r_dst2.y,
            r_dst.w,
            r_dst.h,
        ));
        Ok(())
    }

    /// Segments of the perspective-projected alignment grid in source-image
    /// space: interior quarter lines of the quadrilateral. Empty when no
    /// quadrilateral is present or it is degenerate.
    pub fn ruler_lines(&self) -> Vec<(Point, Point)> {
        let Some(quad) = self.quad.as_ref() else {
            return Vec::new();
        };
        let unit = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        let dst = [
            quad[0].position(),
            quad[1].position(),
            quad[2].position(),
            quad[3].position(),
        ];
        let h = match Homography::quad_to_quad(&unit, &dst) {
            Ok(h) => h,
            Err(_) => return Vec::new(),
        };
        let samples = [
            (25.0, 0.0, 25.0, 100.0),
            (50.0, 0.0, 50.0, 100.0),
            (75.0, 0.0, 75.0, 100.0),
            (0.0, 25.0, 100.0, 25.0),
            (0.0, 50.0, 100.0, 50.0),
            (0.0, 75.0, 100.0, 75.0),
        ];
        samples
            .iter()
            .map(|&(x0, y0, x1, y1)| {
                (
                    h.apply(Point::new(x0, y0)),
                    h.apply(Point::new(x1, y1)),
                )
            })
            .collect()
    }

    /// Screen-space extent of the displayed rendition, for view fitting
    pub fn area(&self, view: &CoordinateTransform) -> Option<Rect> {
        if !self.show_picture || self.src_img.is_none() {
            return None;
        }
        match self.displayed_variant {
            DisplayVariant::Src => {
                let ct = view.join(&self.src_ct);
                if self.show_only_in_frame {
                    let quad = self.quad.as_ref()?;
                    let mut r = Rect::at(quad[0].x, quad[0].y);
                    for m in &quad[1..] {
                        r = r.union_point(&m.position());
                    }
                    Some(r.transform(&ct))
                } else {
                    let img = self.src_img.as_ref()?;
                    Some(
                        Rect::new(0.0, 0.0, img.width() as f64, img.height() as f64)
                            .transform(&ct),
                    )
                }
            }
            DisplayVariant::Dst => {
                let ct = view.join(&self.dst_ct);
                if self.show_only_in_frame {
                    self.warped_rect.map(|r| r.transform(&ct))
                } else {
                    self.dst_img.as_ref().map(|img| {
                        Rect::new(0.0, 0.0, img.width() as f64, img.height() as f64)
                            .transform(&ct)
                    })
                }
            }
        }
    }

    pub fn save(&self) -> ReferencePictureState {
        ReferencePictureState {
            show_picture: self.show_picture,
            show_frame: self.show_frame,
            show_only_in_frame: self.show_only_in_frame,
            displayed_variant: self.displayed_variant,
            quadrilateral: self
                .quad
                .as_ref()
                .map(|q| [q[0].position(), q[1].position(), q[2].position(), q[3].position()]),
            warped_rect: self.warped_rect,
            source_view_transform: Some(self.src_ct.save()),
            dest_view_transform: Some(self.dst_ct.save()),
        }
    }

    /// Restore persisted state. When the source bitmap is already present
    /// and a warp was saved, the warped bitmap is re-derived; failures there
    /// degrade to the unwarped state rather than propagating.
    pub fn load(&mut self, s: &ReferencePictureState) {
        self.show_picture = s.show_picture;
        self.show_frame = s.show_frame;
        self.show_only_in_frame = s.show_only_in_frame;
        self.displayed_variant = s.displayed_variant;
        self.quad = s
            .quadrilateral
            .map(|q| [
                Marker::new(q[0].x, q[0].y),
                Marker::new(q[1].x, q[1].y),
                Marker::new(q[2].x, q[2].y),
                Marker::new(q[3].x, q[3].y),
            ]);
        self.warped_rect = s.warped_rect;
        if let Some(ct) = &s.source_view_transform {
            self.src_ct.load(ct);
        }
        if let Some(ct) = &s.dest_view_transform {
            self.dst_ct.load(ct);
        }
        if self.src_img.is_some() && self.quad.is_some() {
            if let Some(wr) = self.warped_rect {
                let target = wr.transform(&self.dst_ct);
                if let Err(e) = self.set_perspective(&target) {
                    warn!("could not re-derive warp on load: {}", e);
                    self.dst_img = None;
                    self.warped_rect = None;
                }
            }
        }
    }
}

/// Corners of `r` shifted by `(xoff, yoff)`, in quad order (top-left,
/// bottom-left, bottom-right, top-right)
fn rect_corners(r: &Rect, xoff: f64, yoff: f64) -> [Point; 4] {
    let x0 = r.x + xoff;
    let y0 = r.y + yoff;
    let x1 = r.x1() + xoff;
    let y1 = r.y1() + yoff;
    [
        Point::new(x0, y0),
        Point::new(x0, y1),
        Point::new(x1, y1),
        Point::new(x1, y0),
    ]
}

/// Encode a picture as a PNG data URL for the session store
pub fn picture_to_data_url(img: &RgbaImage) -> Result<String, PerspectiveError> {
    let mut bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .map_err(|e| PerspectiveError::Encode(e.to_string()))?;
    Ok(format!("{}{}", DATA_URL_PREFIX, BASE64.encode(&bytes)))
}

/// Decode a picture from a stored data URL
pub fn picture_from_data_url(data_url: &str) -> Result<RgbaImage, PerspectiveError> {
    let b64 = data_url
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .ok_or_else(|| PerspectiveError::Decode("not a base64 data URL".to_string()))?;
    let bytes = BASE64
        .decode(b64)
        .map_err(|e| PerspectiveError::Decode(e.to_string()))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| PerspectiveError::Decode(e.to_string()))?;
    Ok(img.to_rgba8())
}
