//! Rect-fill mode: rubber-band a rectangle and fill it on release

use crate::editor::EditorDoc;
use crate::tools::{DragTrack, ModeBehavior, ModeKind, PointerButton, PointerEvent};

#[derive(Debug, Default)]
pub struct RectFillMode {
    drag: DragTrack,
}

impl RectFillMode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModeBehavior for RectFillMode {
    fn kind(&self) -> ModeKind {
        ModeKind::RectFill
    }

    fn on_pointer_down(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left {
            return;
        }
        self.drag.press(e.x, e.y);
        let (x, y) = doc.block_pos(e);
        doc.blocks.rect_start(x, y);
        doc.set_status("1 x 1");
    }

    fn on_pointer_move(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if !self.drag.pressed {
            return;
        }
        self.drag.step(e.x, e.y);
        let (x, y) = doc.block_pos(e);
        doc.blocks.rect_move(x, y);
        if let Some((x0, y0, x1, y1)) = doc.blocks.pending_rect() {
            doc.set_status(format!(
                "{} x {}",
                (x0 - x1).abs() + 1,
                (y0 - y1).abs() + 1
            ));
        }
    }

    fn on_pointer_up(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left || !self.drag.pressed {
            return;
        }
        self.drag.release();
        doc.blocks.rect_fill(doc.selected_block.as_deref());
        doc.request_save();
    }
}
