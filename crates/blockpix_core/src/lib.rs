//! Core data structures for the blockpix pixel-art editor
//!
//! This crate provides the fundamental types for representing a block-art
//! canvas painted over a reference photo:
//! - `CoordinateTransform` - Affine map between grid space and screen space
//! - `Point` / `Rect` / `Marker` - Geometric primitives
//! - `IndexGrid` - Dense 2-D grid of small block-type indices
//! - `BlockType` / `BlockGroup` - The block palette catalog
//! - `BlockBuffer` - The index grid plus the index↔type mapping and tools
//! - `SessionState` - Serializable snapshot of a full editing session

mod block;
mod buffer;
mod geom;
mod grid;
mod session;
mod transform;

pub use block::{block_catalog, BlockCatalog, BlockGroup, BlockType};
pub use buffer::{
    BlockBuffer, BlockBufferState, MinecraftDir, MinecraftMapping, MinecraftState, TallyEntry,
    TallyResult, WorldCoordinate,
};
pub use geom::{Marker, Point, Rect};
pub use grid::{GridError, IndexGrid, IndexGridState};
pub use session::{
    BackgroundKind, DisplayVariant, ReferencePictureState, SaveFile, SessionState,
};
pub use transform::{CoordinateTransform, CoordinateTransformState};
