//! Erase mode: click or drag to clear cells

use crate::editor::EditorDoc;
use crate::tools::{DragTrack, ModeBehavior, ModeKind, PointerButton, PointerEvent};

#[derive(Debug, Default)]
pub struct EraseMode {
    drag: DragTrack,
}

impl EraseMode {
    pub fn new() -> Self {
        Self::default()
    }
}

fn erase(doc: &mut EditorDoc, e: &PointerEvent) {
    let (x, y) = doc.block_pos(e);
    if doc.blocks.set_block(x, y, None) {
        doc.request_save();
    }
}

impl ModeBehavior for EraseMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Erase
    }

    fn on_pointer_down(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left {
            return;
        }
        self.drag.press(e.x, e.y);
        erase(doc, e);
    }

    fn on_pointer_move(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if !self.drag.pressed {
            return;
        }
        self.drag.step(e.x, e.y);
        erase(doc, e);
    }

    fn on_pointer_up(&mut self, _doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button == PointerButton::Left {
            self.drag.release();
        }
    }

    fn on_click(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        erase(doc, e);
    }
}
