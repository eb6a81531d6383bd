//! Editor logic for the blockpix pixel-art editor
//!
//! Everything above the raw data model: perspective rectification of the
//! reference photo, the interaction modes, the orchestrating [`PixelEditor`]
//! and durable session persistence. There is no rendering here; a host shell
//! feeds pointer/keyboard/wheel events in and draws the document out.

pub mod editor;
pub mod homography;
pub mod matching;
pub mod reference;
pub mod store;
pub mod tools;

pub use editor::{EditorDoc, EditorError, PixelEditor, PICTURE_KEY, SESSION_KEY};
pub use homography::{warp_perspective, Homography, HomographyError};
pub use matching::place_blocks;
pub use reference::{
    picture_from_data_url, picture_to_data_url, PerspectiveError, ReferencePicture,
};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
pub use tools::{
    DragTrack, Key, ModeBehavior, ModeKind, ModeState, PointerButton, PointerEvent,
};
