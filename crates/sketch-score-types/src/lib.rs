//! Shared domain models for the sketch-score workspace.
//!
//! This crate centralizes the lightweight raster types passed between the
//! loader, comparator, and diagnostic sink crates. Keep it free of codec and
//! logging dependencies so every crate can depend on it cheaply.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

pub type MaskResult<T> = Result<T, MaskError>;

/// Value stored for an ink pixel in a [`BinaryMask`].
pub const INK: u8 = 255;
/// Value stored for a background pixel in a [`BinaryMask`].
pub const BACKGROUND: u8 = 0;

/// Immutable 8-bit grayscale raster, row-major without padding.
#[derive(Clone)]
pub struct GrayGrid {
    width: usize,
    height: usize,
    data: Arc<[u8]>,
}

impl fmt::Debug for GrayGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrayGrid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl GrayGrid {
    pub fn from_owned(width: usize, height: usize, data: Vec<u8>) -> MaskResult<Self> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
        })
    }

    /// Builds a grid by evaluating `f(x, y)` for every sample.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Boolean ink raster stored as `INK`/`BACKGROUND` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl fmt::Debug for BinaryMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryMask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("ink", &self.ink_count())
            .finish()
    }
}

impl BinaryMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![BACKGROUND; width * height],
        }
    }

    /// Wraps raw bytes; any non-zero value counts as ink and is stored as `INK`.
    pub fn from_owned(width: usize, height: usize, mut data: Vec<u8>) -> MaskResult<Self> {
        check_len(width, height, data.len())?;
        for value in data.iter_mut() {
            if *value != BACKGROUND {
                *value = INK;
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.data[y * width + x] = INK;
                }
            }
        }
        mask
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_ink(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != BACKGROUND
    }

    pub fn ink_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != BACKGROUND).count()
    }

    pub fn invert_in_place(&mut self) {
        for value in self.data.iter_mut() {
            *value = if *value == BACKGROUND { INK } else { BACKGROUND };
        }
    }

    /// Smallest rectangle covering every ink pixel, or `None` for an empty mask.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut found = false;
        for (y, row) in self.data.chunks_exact(self.width.max(1)).enumerate() {
            let Some(first) = row.iter().position(|&v| v != BACKGROUND) else {
                continue;
            };
            let last = row.iter().rposition(|&v| v != BACKGROUND).unwrap_or(first);
            found = true;
            min_x = min_x.min(first);
            max_x = max_x.max(last);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        if !found {
            return None;
        }
        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    /// Copies the pixels inside `bounds` into a new mask.
    pub fn crop(&self, bounds: BoundingBox) -> MaskResult<Self> {
        if bounds.x + bounds.width > self.width || bounds.y + bounds.height > self.height {
            return Err(MaskError::OutOfBounds {
                bounds,
                width: self.width,
                height: self.height,
            });
        }
        let mut data = Vec::with_capacity(bounds.width * bounds.height);
        for y in bounds.y..bounds.y + bounds.height {
            let start = y * self.width + bounds.x;
            data.extend_from_slice(&self.data[start..start + bounds.width]);
        }
        Ok(Self {
            width: bounds.width,
            height: bounds.height,
            data,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BoundingBox {
    pub fn min_side(&self) -> usize {
        self.width.min(self.height)
    }
}

/// Which side of a comparison an image belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SketchRole {
    Reference,
    Attempt,
}

impl SketchRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SketchRole::Reference => "reference",
            SketchRole::Attempt => "attempt",
        }
    }
}

impl fmt::Display for SketchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("raster buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    BufferLength {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("raster dimensions {width}x{height} overflow")]
    Overflow { width: usize, height: usize },

    #[error("crop {bounds:?} exceeds {width}x{height} mask")]
    OutOfBounds {
        bounds: BoundingBox,
        width: usize,
        height: usize,
    },
}

fn check_len(width: usize, height: usize, actual: usize) -> MaskResult<()> {
    let expected = width
        .checked_mul(height)
        .ok_or(MaskError::Overflow { width, height })?;
    if actual != expected {
        return Err(MaskError::BufferLength {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}
