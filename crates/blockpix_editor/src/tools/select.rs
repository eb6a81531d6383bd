//! Select mode: cell inspection, rubber-band selection and quad-corner drags

use blockpix_core::Rect;

use crate::editor::EditorDoc;
use crate::tools::{DragTrack, ModeBehavior, ModeKind, PointerButton, PointerEvent};

#[derive(Debug, Default)]
pub struct SelectMode {
    drag: DragTrack,
    /// Cell under the press when the drag is a block selection
    start_cell: Option<(i32, i32)>,
}

impl SelectMode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModeBehavior for SelectMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Select
    }

    fn on_pointer_down(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left {
            return;
        }
        self.drag.press(e.x, e.y);
        self.start_cell = None;
        // A press on a picture corner wins over block selection
        if doc.picture.show_picture && doc.picture.pointer_down(&doc.view, e.x, e.y) {
            return;
        }
        if doc.blocks.show_blocks {
            let (x, y) = doc.block_pos(e);
            self.start_cell = Some((x, y));
            // The press seeds a 1x1 band; dragging across a cell boundary
            // grows it, and only a band still 1x1 at click time selects
            doc.blocks.selected_rect = Some(Rect::new(x as f64, y as f64, 1.0, 1.0));
        }
    }

    fn on_pointer_move(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if !self.drag.pressed {
            return;
        }
        let (dx, dy) = self.drag.step(e.x, e.y);
        if doc.picture.is_grabbing() {
            doc.picture.pointer_move(&doc.view, dx, dy);
        } else if let Some((x0, y0)) = self.start_cell {
            let (x1, y1) = doc.block_pos(e);
            let r = Rect::from_two_points(x0 as f64, y0 as f64, x1 as f64, y1 as f64);
            doc.set_status(format!("{} x {}", r.w as i32, r.h as i32));
            doc.blocks.selected_rect = Some(r);
        }
    }

    fn on_pointer_up(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left || !self.drag.pressed {
            return;
        }
        self.drag.release();
        self.start_cell = None;
        if doc.picture.pointer_up() {
            doc.request_save();
        }
    }

    fn on_click(&mut self, doc: &mut EditorDoc, _e: &PointerEvent) {
        // A wider band means the press was a drag; leave it intact
        if let Some(r) = doc.blocks.selected_rect {
            if r.w == 1.0 && r.h == 1.0 {
                let msg = doc.blocks.select(r.x as i32, r.y as i32);
                doc.set_status(msg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> EditorDoc {
        EditorDoc::new(640.0, 480.0)
    }

    #[test]
    fn test_click_selects_cell() {
        let mut doc = doc();
        doc.blocks.set_block(1, 1, Some("pink_wool"));
        let mut mode = SelectMode::new();
        // Default view scale is 16, so screen (24, 24) is cell (1, 1)
        let e = PointerEvent::left(24.0, 24.0);
        mode.on_pointer_down(&mut doc, &e);
        mode.on_pointer_up(&mut doc, &e);
        mode.on_click(&mut doc, &e);
        assert_eq!(
            doc.blocks.selected_rect,
            Some(Rect::new(1.0, 1.0, 1.0, 1.0))
        );
        assert!(doc.status().contains("Pink Wool"));
    }

    #[test]
    fn test_drag_builds_rubber_band_and_suppresses_click() {
        let mut doc = doc();
        let mut mode = SelectMode::new();
        mode.on_pointer_down(&mut doc, &PointerEvent::left(8.0, 8.0));
        mode.on_pointer_move(&mut doc, &PointerEvent::left(40.0, 40.0));
        assert_eq!(
            doc.blocks.selected_rect,
            Some(Rect::new(0.0, 0.0, 3.0, 3.0))
        );
        assert_eq!(doc.status(), "3 x 3");
        mode.on_pointer_up(&mut doc, &PointerEvent::left(40.0, 40.0));
        mode.on_click(&mut doc, &PointerEvent::left(40.0, 40.0));
        // The drag's selection survives the trailing click
        assert_eq!(
            doc.blocks.selected_rect,
            Some(Rect::new(0.0, 0.0, 3.0, 3.0))
        );
    }

    #[test]
    fn test_short_drag_across_cells_keeps_band() {
        let mut doc = doc();
        let mut mode = SelectMode::new();
        // Two pixels of travel, but it crosses from cell (0,0) into (1,0)
        mode.on_pointer_down(&mut doc, &PointerEvent::left(15.0, 8.0));
        mode.on_pointer_move(&mut doc, &PointerEvent::left(17.0, 8.0));
        assert_eq!(
            doc.blocks.selected_rect,
            Some(Rect::new(0.0, 0.0, 2.0, 1.0))
        );
        mode.on_pointer_up(&mut doc, &PointerEvent::left(17.0, 8.0));
        mode.on_click(&mut doc, &PointerEvent::left(17.0, 8.0));
        assert_eq!(
            doc.blocks.selected_rect,
            Some(Rect::new(0.0, 0.0, 2.0, 1.0))
        );
    }

    #[test]
    fn test_corner_grab_wins_over_selection() {
        let mut doc = doc();
        doc.picture
            .load_picture(image::RgbaImage::new(32, 32));
        let mut mode = SelectMode::new();
        // src_ct is 1/16 and the view is 16, so corner 0 sits at screen (0,0)
        mode.on_pointer_down(&mut doc, &PointerEvent::left(2.0, 2.0));
        assert!(doc.picture.is_grabbing());
        mode.on_pointer_move(&mut doc, &PointerEvent::left(10.0, 2.0));
        // No rubber band was started
        assert_eq!(doc.blocks.selected_rect, None);
        let q = doc.picture.quad().unwrap();
        assert!((q[0].x - 8.0).abs() < 1e-9);
        mode.on_pointer_up(&mut doc, &PointerEvent::left(10.0, 2.0));
        assert!(!doc.picture.is_grabbing());
    }
}
