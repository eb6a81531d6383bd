//! Interaction modes
//!
//! One module per mode; each implements [`ModeBehavior`] against the shared
//! [`EditorDoc`](crate::editor::EditorDoc). Exactly one mode is active at a
//! time, held in the [`ModeState`] tagged union; switching always runs the
//! outgoing mode's `on_unselect` before the incoming mode's `on_select`.

pub mod artboard;
pub mod erase;
pub mod paint;
pub mod pan;
pub mod rect_fill;
pub mod select;
pub mod spoid;

use crate::editor::EditorDoc;

pub use artboard::ArtboardMode;
pub use erase::EraseMode;
pub use paint::PaintMode;
pub use pan::PanMode;
pub use rect_fill::RectFillMode;
pub use select::SelectMode;
pub use spoid::SpoidMode;

/// The seven interaction modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Select,
    Pan,
    Artboard,
    Paint,
    Erase,
    RectFill,
    Spoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// A pointer event in canvas-relative screen coordinates
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub button: PointerButton,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, button: PointerButton) -> Self {
        Self { x, y, button }
    }

    pub fn left(x: f64, y: f64) -> Self {
        Self::new(x, y, PointerButton::Left)
    }

    pub fn middle(x: f64, y: f64) -> Self {
        Self::new(x, y, PointerButton::Middle)
    }
}

/// Keys the editor reacts to; everything else arrives as `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Control,
    Space,
    Other,
}

/// Drag bookkeeping shared by the modes: press origin, step deltas and the
/// peak displacement (to tell clicks from drags)
#[derive(Debug, Clone, Copy, Default)]
pub struct DragTrack {
    pub pressed: bool,
    pub x0: f64,
    pub y0: f64,
    last_x: f64,
    last_y: f64,
    pub moved: f64,
}

impl DragTrack {
    pub fn press(&mut self, x: f64, y: f64) {
        *self = DragTrack {
            pressed: true,
            x0: x,
            y0: y,
            last_x: x,
            last_y: y,
            moved: 0.0,
        };
    }

    /// Screen delta since the previous event; also accumulates the peak
    /// displacement from the press origin
    pub fn step(&mut self, x: f64, y: f64) -> (f64, f64) {
        let d = (x - self.last_x, y - self.last_y);
        self.last_x = x;
        self.last_y = y;
        self.moved = self
            .moved
            .max((x - self.x0).abs().max((y - self.y0).abs()));
        d
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }
}

/// The capability set a mode can implement; unhandled events default to no-op
pub trait ModeBehavior {
    fn kind(&self) -> ModeKind;
    fn on_select(&mut self, _doc: &mut EditorDoc) {}
    fn on_unselect(&mut self, _doc: &mut EditorDoc) {}
    fn on_pointer_down(&mut self, _doc: &mut EditorDoc, _e: &PointerEvent) {}
    fn on_pointer_move(&mut self, _doc: &mut EditorDoc, _e: &PointerEvent) {}
    fn on_pointer_up(&mut self, _doc: &mut EditorDoc, _e: &PointerEvent) {}
    fn on_click(&mut self, _doc: &mut EditorDoc, _e: &PointerEvent) {}
}

/// The active mode with its transient per-mode state
#[derive(Debug)]
pub enum ModeState {
    Select(SelectMode),
    Pan(PanMode),
    Artboard(ArtboardMode),
    Paint(PaintMode),
    Erase(EraseMode),
    RectFill(RectFillMode),
    Spoid(SpoidMode),
}

impl Default for ModeState {
    fn default() -> Self {
        ModeState::Select(SelectMode::new())
    }
}

impl ModeState {
    pub fn new(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Select => ModeState::Select(SelectMode::new()),
            ModeKind::Pan => ModeState::Pan(PanMode::new()),
            ModeKind::Artboard => ModeState::Artboard(ArtboardMode::new()),
            ModeKind::Paint => ModeState::Paint(PaintMode::new()),
            ModeKind::Erase => ModeState::Erase(EraseMode::new()),
            ModeKind::RectFill => ModeState::RectFill(RectFillMode::new()),
            ModeKind::Spoid => ModeState::Spoid(SpoidMode::new()),
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.as_behavior_ref().kind()
    }

    pub fn as_behavior(&mut self) -> &mut dyn ModeBehavior {
        match self {
            ModeState::Select(m) => m,
            ModeState::Pan(m) => m,
            ModeState::Artboard(m) => m,
            ModeState::Paint(m) => m,
            ModeState::Erase(m) => m,
            ModeState::RectFill(m) => m,
            ModeState::Spoid(m) => m,
        }
    }

    fn as_behavior_ref(&self) -> &dyn ModeBehavior {
        match self {
            ModeState::Select(m) => m,
            ModeState::Pan(m) => m,
            ModeState::Artboard(m) => m,
            ModeState::Paint(m) => m,
            ModeState::Erase(m) => m,
            ModeState::RectFill(m) => m,
            ModeState::Spoid(m) => m,
        }
    }
}
