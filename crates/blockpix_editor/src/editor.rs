//! The editor orchestrator
//!
//! [`PixelEditor`] owns the document, the active interaction mode and the
//! session store. All mutation is driven through synthetic pointer, keyboard
//! and wheel events; a host shell forwards real input and renders the
//! document however it likes.

use log::{debug, warn};
use serde_json::{from_str, to_string};

use blockpix_core::{
    BackgroundKind, BlockBuffer, CoordinateTransform, Rect, SaveFile, SessionState,
};

use crate::matching;
use crate::reference::{
    picture_from_data_url, picture_to_data_url, PerspectiveError, ReferencePicture,
};
use crate::store::{SessionStore, StoreError};
use crate::tools::{Key, ModeBehavior, ModeKind, ModeState, PointerButton, PointerEvent};

pub const SESSION_KEY: &str = "pixelEditor";
pub const PICTURE_KEY: &str = "pixelEditor-picture";

/// Pictures whose encoded data URL exceeds this are not persisted
const MAX_PICTURE_CHARS: usize = 4_000_000;

/// Coordinate-frame metrics: the ruler strips and their margins
const FRAME_MARGIN_W: f64 = 3.0;
const FRAME_MARGIN_H: f64 = 3.0;
const FRAME_WIDTH: f64 = 60.0;
const FRAME_HEIGHT: f64 = 20.0;

#[derive(Debug)]
pub enum EditorError {
    Store(StoreError),
    Parse(String),
    Perspective(PerspectiveError),
    /// The picture was installed but is too large to persist
    PictureTooLarge,
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Store(e) => write!(f, "session store error: {}", e),
            EditorError::Parse(e) => write!(f, "could not parse session data: {}", e),
            EditorError::Perspective(e) => write!(f, "{}", e),
            EditorError::PictureTooLarge => {
                write!(f, "picture too large to store; it will not survive this session")
            }
        }
    }
}

impl std::error::Error for EditorError {}

impl From<StoreError> for EditorError {
    fn from(e: StoreError) -> Self {
        EditorError::Store(e)
    }
}

impl From<PerspectiveError> for EditorError {
    fn from(e: PerspectiveError) -> Self {
        EditorError::Perspective(e)
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(e: serde_json::Error) -> Self {
        EditorError::Parse(e.to_string())
    }
}

/// Everything the modes operate on: the block buffer, the reference picture,
/// the view and the ambient editing state
#[derive(Debug)]
pub struct EditorDoc {
    pub blocks: BlockBuffer,
    pub picture: ReferencePicture,
    pub view: CoordinateTransform,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub background_type: BackgroundKind,
    pub background_color: String,
    pub selected_block: Option<String>,
    status: String,
    save_requested: bool,
}

impl EditorDoc {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            blocks: BlockBuffer::default(),
            picture: ReferencePicture::new(),
            view: CoordinateTransform::default(),
            canvas_width,
            canvas_height,
            background_type: BackgroundKind::default(),
            background_color: "#808080".to_string(),
            selected_block: None,
            status: String::new(),
            save_requested: false,
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
    }

    /// Ask the orchestrator to persist after the current event
    pub fn request_save(&mut self) {
        self.save_requested = true;
    }

    fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    /// Grid cell under a pointer event
    pub fn block_pos(&self, e: &PointerEvent) -> (i32, i32) {
        (self.view.from_x(e.x), self.view.from_y(e.y))
    }

    /// Pick the block under a cell into the current selection; reports
    /// whether the cell held a type
    pub fn spoid(&mut self, x: i32, y: i32) -> bool {
        match self.blocks.get_block(x, y).map(str::to_string) {
            Some(id) => {
                let name = self
                    .blocks
                    .catalog()
                    .get(&id)
                    .map(|t| t.name.clone())
                    .unwrap_or_default();
                self.set_status(name);
                self.selected_block = Some(id);
                true
            }
            None => {
                self.selected_block = None;
                self.set_status("");
                false
            }
        }
    }

    /// The canvas area available for content, excluding the coordinate frame
    /// strips when they are shown
    pub fn canvas_rect(&self) -> Rect {
        let (x, y) = if self.blocks.show_blocks && self.blocks.show_frame {
            (FRAME_MARGIN_W + FRAME_WIDTH, FRAME_MARGIN_H + FRAME_HEIGHT)
        } else {
            (0.0, 0.0)
        };
        Rect::new(x, y, self.canvas_width - x, self.canvas_height - y)
    }

    /// Combined screen extent of everything visible
    pub fn content_area(&self) -> Option<Rect> {
        let blocks = self.blocks.area(&self.view);
        let picture = self.picture.area(&self.view);
        match (blocks, picture) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }
}

/// The top-level editor: document, active mode, keyboard override and store
pub struct PixelEditor {
    pub doc: EditorDoc,
    mode: ModeState,
    /// Mode to restore when a Ctrl/Space override key is released
    override_prev: Option<ModeKind>,
    store: Box<dyn SessionStore>,
    last_saved: Option<String>,
}

impl PixelEditor {
    pub fn new(store: Box<dyn SessionStore>, canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            doc: EditorDoc::new(canvas_width, canvas_height),
            mode: ModeState::default(),
            override_prev: None,
            store,
            last_saved: None,
        }
    }

    pub fn mode(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Switch modes. The outgoing mode's `on_unselect` always runs before the
    /// incoming mode's `on_select`, including when re-selecting the current
    /// mode (which resets its transient state).
    pub fn set_mode(&mut self, kind: ModeKind) {
        debug!("mode {:?} -> {:?}", self.mode.kind(), kind);
        let mut old = std::mem::replace(&mut self.mode, ModeState::new(kind));
        old.as_behavior().on_unselect(&mut self.doc);
        self.mode.as_behavior().on_select(&mut self.doc);
        self.flush_save();
    }

    pub fn pointer_down(&mut self, e: PointerEvent) {
        self.mode.as_behavior().on_pointer_down(&mut self.doc, &e);
        self.flush_save();
    }

    pub fn pointer_move(&mut self, e: PointerEvent) {
        self.mode.as_behavior().on_pointer_move(&mut self.doc, &e);
        self.flush_save();
    }

    /// Pointer release. A middle-button release is the spoid shortcut: pick
    /// the block under the cursor and switch to paint (type present) or
    /// erase (empty cell).
    pub fn pointer_up(&mut self, e: PointerEvent) {
        if e.button == PointerButton::Middle {
            let (x, y) = self.doc.block_pos(&e);
            let has_block = self.doc.spoid(x, y);
            self.set_mode(if has_block {
                ModeKind::Paint
            } else {
                ModeKind::Erase
            });
            return;
        }
        self.mode.as_behavior().on_pointer_up(&mut self.doc, &e);
        self.flush_save();
    }

    pub fn click(&mut self, e: PointerEvent) {
        self.mode.as_behavior().on_click(&mut self.doc, &e);
        self.flush_save();
    }

    /// Escape returns to select; Ctrl (outside select) and Space (outside
    /// pan) push the current mode and override it until key release
    pub fn key_down(&mut self, key: Key) {
        match key {
            Key::Escape => self.set_mode(ModeKind::Select),
            Key::Control if self.mode.kind() != ModeKind::Select => {
                self.override_prev = Some(self.mode.kind());
                self.set_mode(ModeKind::Select);
            }
            Key::Space if self.mode.kind() != ModeKind::Pan => {
                self.override_prev = Some(self.mode.kind());
                self.set_mode(ModeKind::Pan);
            }
            _ => {}
        }
    }

    pub fn key_up(&mut self, _key: Key) {
        if let Some(prev) = self.override_prev.take() {
            self.set_mode(prev);
        }
    }

    /// Wheel zoom about the cursor: down halves the scale, up doubles it
    pub fn wheel(&mut self, delta_y: f64, x: f64, y: f64) {
        let factor = if delta_y > 0.0 {
            0.5
        } else if delta_y < 0.0 {
            2.0
        } else {
            return;
        };
        self.doc.view.zoom(factor, x, y);
        self.doc.request_save();
        self.flush_save();
    }

    /// Fit everything visible into the frame-adjusted canvas rect
    pub fn view_all(&mut self) {
        let area = self.doc.content_area();
        let dest = self.doc.canvas_rect();
        self.doc.view.view_area(area.as_ref(), &dest);
        self.doc.request_save();
        self.flush_save();
    }

    pub fn resize_canvas(&mut self, width: f64, height: f64) {
        self.doc.canvas_width = width;
        self.doc.canvas_height = height;
    }

    /// Rectify the reference picture's quadrilateral onto the block extent
    pub fn rectify(&mut self) -> Result<(), EditorError> {
        let target = Rect::new(
            0.0,
            0.0,
            self.doc.blocks.col as f64,
            self.doc.blocks.row as f64,
        );
        self.doc.picture.set_perspective(&target)?;
        self.doc.request_save();
        self.flush_save();
        Ok(())
    }

    /// Fill the block buffer from the rectified picture
    pub fn place_blocks(&mut self) -> Result<usize, EditorError> {
        let painted = matching::place_blocks(&self.doc.picture, &mut self.doc.blocks)?;
        self.doc.set_status(format!("{} blocks placed", painted));
        self.doc.request_save();
        self.flush_save();
        Ok(painted)
    }

    fn flush_save(&mut self) {
        if self.doc.take_save_request() {
            if let Err(e) = self.save() {
                warn!("session save failed: {}", e);
            }
        }
    }

    /// Persist the session, skipping the write when nothing changed since
    /// the last successful save
    pub fn save(&mut self) -> Result<(), EditorError> {
        let json = to_string(&self.session_state())?;
        if self.last_saved.as_deref() == Some(json.as_str()) {
            return Ok(());
        }
        self.store.set(SESSION_KEY, &json)?;
        self.last_saved = Some(json);
        Ok(())
    }

    pub fn session_state(&self) -> SessionState {
        SessionState {
            background_type: self.doc.background_type,
            background_color: self.doc.background_color.clone(),
            block: self.doc.blocks.save(),
            template_picture: Some(self.doc.picture.save()),
            view_transform: Some(self.doc.view.save()),
            block_type_enabled: Some(self.doc.blocks.catalog().enabled_map()),
        }
    }

    pub fn set_state(&mut self, s: &SessionState) {
        self.doc.background_type = s.background_type;
        self.doc.background_color = s.background_color.clone();
        self.doc.blocks.load(&s.block);
        if let Some(map) = &s.block_type_enabled {
            self.doc.blocks.catalog_mut().apply_enabled_map(map);
        }
        if let Some(ct) = &s.view_transform {
            self.doc.view.load(ct);
        }
        if let Some(tp) = &s.template_picture {
            self.doc.picture.load(tp);
        }
    }

    /// Restore the previous session from the store. Returns whether a
    /// session was found.
    pub fn load(&mut self) -> Result<bool, EditorError> {
        let Some(json) = self.store.get(SESSION_KEY) else {
            return Ok(false);
        };
        let s: SessionState = from_str(&json)?;
        self.set_state(&s);
        if let Some(data) = self.store.get(PICTURE_KEY) {
            let img = picture_from_data_url(&data)?;
            self.doc.picture.restore_picture(img)?;
        }
        self.last_saved = None;
        Ok(true)
    }

    /// Install a new reference picture from encoded bytes (PNG, JPEG, ...)
    /// and persist it. An oversized picture stays installed but is reported
    /// with [`EditorError::PictureTooLarge`].
    pub fn load_picture_bytes(&mut self, bytes: &[u8]) -> Result<(), EditorError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| EditorError::Perspective(PerspectiveError::Decode(e.to_string())))?
            .to_rgba8();
        self.doc.picture.load_picture(img);
        self.doc.request_save();
        self.flush_save();
        self.persist_picture()
    }

    pub fn clear_picture(&mut self) -> Result<(), EditorError> {
        self.doc.picture.clear_picture();
        self.store.remove(PICTURE_KEY)?;
        self.doc.request_save();
        self.flush_save();
        Ok(())
    }

    fn persist_picture(&mut self) -> Result<(), EditorError> {
        let Some(img) = self.doc.picture.source() else {
            self.store.remove(PICTURE_KEY)?;
            return Ok(());
        };
        let url = picture_to_data_url(img)?;
        if url.len() > MAX_PICTURE_CHARS {
            warn!("picture data URL is {} chars, not persisting", url.len());
            self.store.remove(PICTURE_KEY)?;
            return Err(EditorError::PictureTooLarge);
        }
        self.store.set(PICTURE_KEY, &url)?;
        Ok(())
    }

    /// Serialize the whole document, picture included, for export to a file
    pub fn export(&self) -> Result<String, EditorError> {
        let file = SaveFile {
            state: self.session_state(),
            picture_data: self.store.get(PICTURE_KEY),
        };
        Ok(to_string(&file)?)
    }

    /// Replace the whole document from an exported file
    pub fn import(&mut self, json: &str) -> Result<(), EditorError> {
        let file: SaveFile = from_str(json)?;
        match &file.picture_data {
            Some(data) => {
                let img = picture_from_data_url(data)?;
                self.doc.picture.load_picture(img);
                if data.len() <= MAX_PICTURE_CHARS {
                    self.store.set(PICTURE_KEY, data)?;
                } else {
                    warn!("imported picture too large to persist");
                    self.store.remove(PICTURE_KEY)?;
                }
            }
            None => {
                self.doc.picture.clear_picture();
                self.store.remove(PICTURE_KEY)?;
            }
        }
        // Picture state (quad, transforms, warp) rides in the session state
        // and re-derives against the bitmap installed above
        self.set_state(&file.state);
        self.last_saved = None;
        self.save()
    }
}
