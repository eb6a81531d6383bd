//! Dense 2-D grid of block-type indices

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::Rect;

/// Upper bound on cells per grid (128 MiB of u16). Snapshot dimensions
/// beyond it are treated as corrupt.
const MAX_CELLS: u64 = 1 << 26;

/// Whether a `width × height` grid is within the allocation bound
pub(crate) fn plausible_dims(width: u32, height: u32) -> bool {
    width as u64 * height as u64 <= MAX_CELLS
}

/// Error raised by the raw grid layer on out-of-bounds access
///
/// The convenience layer above ([`BlockBuffer`](crate::BlockBuffer))
/// deliberately tolerates off-grid writes instead; this error surfacing
/// outside of it indicates a caller bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    OutOfRange { x: i32, y: i32 },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::OutOfRange { x, y } => write!(f, "out of range ({}, {})", x, y),
        }
    }
}

impl std::error::Error for GridError {}

/// Serialized snapshot of an [`IndexGrid`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexGridState {
    pub width: u32,
    pub height: u32,
    pub buf: Vec<u16>,
}

/// Fixed-size dense grid of 16-bit block-type indices, row-major
///
/// Index 0 means "empty". Resizing discards the allocation; content
/// preservation across a resize is the owning buffer's job.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGrid {
    width: u32,
    height: u32,
    buf: Vec<u16>,
}

impl IndexGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buf: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset every cell to empty
    pub fn clear(&mut self) {
        self.buf.fill(0);
    }

    pub fn in_range(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height
    }

    /// Write a cell; returns whether the stored value actually changed so
    /// callers can skip redundant redraw/save work
    pub fn set(&mut self, x: i32, y: i32, value: u16) -> Result<bool, GridError> {
        if !self.in_range(x, y) {
            return Err(GridError::OutOfRange { x, y });
        }
        let i = (y as u32 * self.width + x as u32) as usize;
        if self.buf[i] == value {
            Ok(false)
        } else {
            self.buf[i] = value;
            Ok(true)
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Result<u16, GridError> {
        if !self.in_range(x, y) {
            return Err(GridError::OutOfRange { x, y });
        }
        Ok(self.buf[(y as u32 * self.width + x as u32) as usize])
    }

    /// Count occurrences of each index, optionally restricted to `rect`
    /// (grid coordinates). Index 0 ("unfilled") is included.
    pub fn tally(&self, rect: Option<&Rect>) -> HashMap<u16, usize> {
        let mut sum = HashMap::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(r) = rect {
                    if !r.contains(x as f64, y as f64) {
                        continue;
                    }
                }
                let idx = self.buf[(y * self.width + x) as usize];
                *sum.entry(idx).or_insert(0) += 1;
            }
        }
        sum
    }

    pub fn save(&self) -> IndexGridState {
        IndexGridState {
            width: self.width,
            height: self.height,
            buf: self.buf.clone(),
        }
    }

    /// Restore from a snapshot. A payload shorter than `width * height` is
    /// zero-filled rather than rejected; this is the recovery path for
    /// truncated persisted state. Dimensions beyond the allocation bound
    /// load as an empty grid instead of overflowing or exhausting memory.
    pub fn load(&mut self, s: &IndexGridState) {
        if !plausible_dims(s.width, s.height) {
            warn!(
                "grid snapshot {}x{} is implausibly large, loading empty",
                s.width, s.height
            );
            *self = IndexGrid::new(0, 0);
            return;
        }
        self.width = s.width;
        self.height = s.height;
        let len = s.width as usize * s.height as usize;
        let mut buf = vec![0u16; len];
        let n = len.min(s.buf.len());
        buf[..n].copy_from_slice(&s.buf[..n]);
        self.buf = buf;
    }
}
