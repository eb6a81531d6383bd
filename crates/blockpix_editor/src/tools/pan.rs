//! Pan mode: drag to translate the view

use crate::editor::EditorDoc;
use crate::tools::{DragTrack, ModeBehavior, ModeKind, PointerButton, PointerEvent};

#[derive(Debug, Default)]
pub struct PanMode {
    drag: DragTrack,
}

impl PanMode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModeBehavior for PanMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Pan
    }

    fn on_pointer_down(&mut self, _doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button == PointerButton::Left {
            self.drag.press(e.x, e.y);
        }
    }

    fn on_pointer_move(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if !self.drag.pressed {
            return;
        }
        let (dx, dy) = self.drag.step(e.x, e.y);
        doc.view.pan(dx, dy);
    }

    fn on_pointer_up(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        if e.button != PointerButton::Left || !self.drag.pressed {
            return;
        }
        self.drag.release();
        if self.drag.moved > 0.0 {
            doc.request_save();
        }
    }
}
