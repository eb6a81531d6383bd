//! Paint mode: click or drag to write the selected block type

use crate::editor::EditorDoc;
use crate::tools::{DragTrack, ModeBehavior, ModeKind, PointerButton, PointerEvent};

#[derive(Debug, Default)]
pub struct PaintMode {
    drag: DragTrack,
}

impl PaintMode {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paint(doc: &mut EditorDoc, e: &PointerEvent) {
    if doc.selected_block.is_none() {
        return;
    }
    let (x, y) = doc.block_pos(e);
    if doc.blocks.set_block(x, y, doc.selected_block.as_deref()) {
        doc.request_save();
    }
}

impl ModeBehavior for PaintMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Paint
    }

    fn on_pointer_down(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left {
            return;
        }
        self.drag.press(e.x, e.y);
        paint(doc, e);
    }

    fn on_pointer_move(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if !self.drag.pressed {
            return;
        }
        self.drag.step(e.x, e.y);
        paint(doc, e);
    }

    fn on_pointer_up(&mut self, _doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button == PointerButton::Left {
            self.drag.release();
        }
    }

    fn on_click(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        paint(doc, e);
    }
}
