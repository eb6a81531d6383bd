//! Artboard mode: resize the block canvas by dragging edge/corner handles
//!
//! The resize commits on release: the grid is reallocated around the new
//! rect, and the view, the picture transforms and the Minecraft offset are
//! all shifted so on-screen content stays where it was.

use blockpix_core::{CoordinateTransform, Marker, Rect};

use crate::editor::EditorDoc;
use crate::tools::{ModeBehavior, ModeKind, PointerButton, PointerEvent};

/// Which side of an axis a handle moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Fixed,
    Min,
    Max,
}

/// Handle layout: position factor within the rect plus the edges it moves
const HANDLES: [(f64, f64, Edge, Edge); 8] = [
    (0.0, 0.0, Edge::Min, Edge::Min),
    (0.5, 0.0, Edge::Fixed, Edge::Min),
    (1.0, 0.0, Edge::Max, Edge::Min),
    (0.0, 0.5, Edge::Min, Edge::Fixed),
    (1.0, 0.5, Edge::Max, Edge::Fixed),
    (0.0, 1.0, Edge::Min, Edge::Max),
    (0.5, 1.0, Edge::Fixed, Edge::Max),
    (1.0, 1.0, Edge::Max, Edge::Max),
];

/// A rect in grid cells with draggable handles; sizes never drop below 1×1
#[derive(Debug, Clone)]
pub struct ResizableRect {
    rect: Rect,
    base: Rect,
    markers: [Marker; 8],
    dragging: Option<usize>,
    press_x: f64,
    press_y: f64,
}

impl ResizableRect {
    pub fn new(col: u32, row: u32) -> Self {
        let rect = Rect::new(0.0, 0.0, col as f64, row as f64);
        let mut rr = Self {
            rect,
            base: rect,
            markers: [Marker::new(0.0, 0.0); 8],
            dragging: None,
            press_x: 0.0,
            press_y: 0.0,
        };
        rr.place_markers();
        rr
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn markers(&self) -> &[Marker; 8] {
        &self.markers
    }

    fn place_markers(&mut self) {
        for (i, &(fx, fy, _, _)) in HANDLES.iter().enumerate() {
            self.markers[i] =
                Marker::new(self.rect.x + self.rect.w * fx, self.rect.y + self.rect.h * fy);
        }
    }

    /// Begin a handle drag; reports whether a handle was hit
    pub fn pointer_down(&mut self, view: &CoordinateTransform, x: f64, y: f64) -> bool {
        self.dragging = self.markers.iter().position(|m| m.is_hit(view, x, y));
        if self.dragging.is_some() {
            self.base = self.rect;
            self.press_x = x;
            self.press_y = y;
        }
        self.dragging.is_some()
    }

    /// Track a handle drag, snapping to whole cells; reports whether the
    /// rect changed
    pub fn pointer_move(&mut self, view: &CoordinateTransform, x: f64, y: f64) -> bool {
        let Some(i) = self.dragging else {
            return false;
        };
        let dx = ((x - self.press_x) / view.ax).round();
        let dy = ((y - self.press_y) / view.ay).round();
        let (_, _, ex, ey) = HANDLES[i];
        let mut r = self.base;
        match ex {
            Edge::Min => {
                let dx = dx.min(self.base.w - 1.0);
                r.x = self.base.x + dx;
                r.w = self.base.w - dx;
            }
            Edge::Max => r.w = (self.base.w + dx).max(1.0),
            Edge::Fixed => {}
        }
        match ey {
            Edge::Min => {
                let dy = dy.min(self.base.h - 1.0);
                r.y = self.base.y + dy;
                r.h = self.base.h - dy;
            }
            Edge::Max => r.h = (self.base.h + dy).max(1.0),
            Edge::Fixed => {}
        }
        let changed = r != self.rect;
        self.rect = r;
        self.place_markers();
        changed
    }

    /// End a handle drag; reports whether one was in progress
    pub fn pointer_up(&mut self) -> bool {
        self.dragging.take().is_some()
    }
}

#[derive(Debug, Default)]
pub struct ArtboardMode {
    rect: Option<ResizableRect>,
}

impl ArtboardMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rect(&self) -> Option<&ResizableRect> {
        self.rect.as_ref()
    }
}

impl ModeBehavior for ArtboardMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Artboard
    }

    fn on_select(&mut self, doc: &mut EditorDoc) {
        self.rect = Some(ResizableRect::new(doc.blocks.col, doc.blocks.row));
        doc.set_status(format!("{} x {}", doc.blocks.col, doc.blocks.row));
    }

    fn on_unselect(&mut self, doc: &mut EditorDoc) {
        self.rect = None;
        // The size readout belongs to this mode; take it down with the rect
        doc.set_status(String::new());
    }

    fn on_pointer_down(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left {
            return;
        }
        if let Some(r) = &mut self.rect {
            r.pointer_down(&doc.view, e.x, e.y);
        }
    }

    fn on_pointer_move(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if let Some(r) = &mut self.rect {
            if r.pointer_move(&doc.view, e.x, e.y) {
                let rr = r.rect();
                doc.set_status(format!("{} x {}", rr.w as i32, rr.h as i32));
            }
        }
    }

    fn on_pointer_up(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left {
            return;
        }
        let Some(r) = &mut self.rect else { return };
        if !r.pointer_up() {
            return;
        }
        let target = r.rect();
        let current = Rect::new(0.0, 0.0, doc.blocks.col as f64, doc.blocks.row as f64);
        if target != current {
            doc.blocks.resize(&target);
            // Keep content stationary on screen and in world coordinates
            doc.view.bx += doc.view.ax * target.x;
            doc.view.by += doc.view.ay * target.y;
            doc.picture.src_ct.bx -= target.x;
            doc.picture.src_ct.by -= target.y;
            doc.picture.dst_ct.bx -= target.x;
            doc.picture.dst_ct.by -= target.y;
            if let Some(m) = &mut doc.blocks.minecraft {
                m.shift_for_resize(target.x as i32, target.y as i32);
            }
            doc.request_save();
        }
        *r = ResizableRect::new(doc.blocks.col, doc.blocks.row);
        doc.set_status(format!("{} x {}", doc.blocks.col, doc.blocks.row));
    }
}
