//! Spoid (eyedropper) mode: pick the block type under the cursor

use crate::editor::EditorDoc;
use crate::tools::{ModeBehavior, ModeKind, PointerEvent};

#[derive(Debug, Default)]
pub struct SpoidMode;

impl SpoidMode {
    pub fn new() -> Self {
        Self
    }
}

impl ModeBehavior for SpoidMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Spoid
    }

    fn on_click(&mut self, doc: &mut EditorDoc, e: &PointerEvent) {
        let (x, y) = doc.block_pos(e);
        doc.spoid(x, y);
    }
}
