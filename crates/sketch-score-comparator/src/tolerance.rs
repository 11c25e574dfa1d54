//! Packed bit masks and disk dilation used to build tolerance ("safe") zones.
//!
//! Rows are stored as little-endian runs of `u64` words: bit `i` of word `w`
//! holds column `w * 64 + i`. Bits past the row width are always zero.

use sketch_score_types::{BACKGROUND, BinaryMask};

use crate::error::{ComparisonError, ComparisonResult};

#[derive(Clone, PartialEq, Eq)]
pub struct PackedMask {
    width: usize,
    height: usize,
    words_per_row: usize,
    last_word_mask: u64,
    bits: Vec<u64>,
}

impl std::fmt::Debug for PackedMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedMask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("ones", &self.count_ones())
            .finish()
    }
}

impl PackedMask {
    pub fn from_mask(mask: &BinaryMask) -> Self {
        let width = mask.width();
        let height = mask.height();
        let words_per_row = width.div_ceil(64);
        let last_word_mask = if width % 64 == 0 {
            !0u64
        } else {
            (1u64 << (width % 64)) - 1
        };
        let mut bits = vec![0u64; words_per_row * height];
        if words_per_row > 0 {
            for (row, bits_row) in mask
                .data()
                .chunks_exact(width)
                .zip(bits.chunks_exact_mut(words_per_row))
            {
                pack_row(row, bits_row, last_word_mask);
            }
        }
        Self {
            width,
            height,
            words_per_row,
            last_word_mask,
            bits,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        let word = self.bits[y * self.words_per_row + x / 64];
        (word >> (x % 64)) & 1 == 1
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Population count of `self & other`.
    pub fn intersection_count(&self, other: &PackedMask) -> ComparisonResult<usize> {
        self.ensure_same_shape(other)?;
        Ok(self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum())
    }

    pub fn to_mask(&self) -> BinaryMask {
        BinaryMask::from_fn(self.width, self.height, |x, y| self.get(x, y))
    }

    /// Dilates by a disk: a bit is set when some source bit lies at an offset
    /// `(dx, dy)` with `dx * dx + dy * dy <= radius * radius`.
    pub fn dilate_disk(&self, radius: usize) -> PackedMask {
        if radius == 0 || self.bits.is_empty() {
            return self.clone();
        }
        let wpr = self.words_per_row;

        // horizontal[k] is the source dilated by k columns in both directions.
        let mut horizontal: Vec<Vec<u64>> = Vec::with_capacity(radius + 1);
        horizontal.push(self.bits.clone());
        for k in 1..=radius {
            let prev = &horizontal[k - 1];
            let mut next = vec![0u64; prev.len()];
            for (src_row, dst_row) in prev.chunks_exact(wpr).zip(next.chunks_exact_mut(wpr)) {
                dilate_row_once(src_row, dst_row, self.last_word_mask);
            }
            horizontal.push(next);
        }

        let mut out = vec![0u64; self.bits.len()];
        let r = radius as isize;
        for dy in -r..=r {
            let half = chord_half_width(radius, dy.unsigned_abs());
            let src = &horizontal[half];
            for y in 0..self.height {
                let sy = y as isize + dy;
                if sy < 0 || sy >= self.height as isize {
                    continue;
                }
                let src_row = &src[sy as usize * wpr..(sy as usize + 1) * wpr];
                let dst_row = &mut out[y * wpr..(y + 1) * wpr];
                for (slot, &word) in dst_row.iter_mut().zip(src_row.iter()) {
                    *slot |= word;
                }
            }
        }

        PackedMask {
            width: self.width,
            height: self.height,
            words_per_row: wpr,
            last_word_mask: self.last_word_mask,
            bits: out,
        }
    }

    fn ensure_same_shape(&self, other: &PackedMask) -> ComparisonResult<()> {
        if self.width != other.width || self.height != other.height {
            return Err(ComparisonError::DimensionMismatch {
                left_width: self.width,
                left_height: self.height,
                right_width: other.width,
                right_height: other.height,
            });
        }
        Ok(())
    }
}

/// Builds the safe zone of a canonical mask for the given tolerance radius.
pub fn build_safe_zone(mask: &PackedMask, radius: usize) -> PackedMask {
    mask.dilate_disk(radius)
}

/// Largest `w` with `w * w + dy * dy <= radius * radius`.
fn chord_half_width(radius: usize, dy: usize) -> usize {
    let limit = radius * radius;
    let rem = limit.saturating_sub(dy * dy);
    let mut w = (rem as f64).sqrt() as usize;
    while (w + 1) * (w + 1) <= rem {
        w += 1;
    }
    while w > 0 && w * w > rem {
        w -= 1;
    }
    w
}

fn pack_row(row: &[u8], bits_row: &mut [u64], last_word_mask: u64) {
    for (chunk, word) in row.chunks(64).zip(bits_row.iter_mut()) {
        let mut value = 0u64;
        for (i, &v) in chunk.iter().enumerate() {
            if v != BACKGROUND {
                value |= 1u64 << i;
            }
        }
        *word = value;
    }
    if let Some(last) = bits_row.last_mut() {
        *last &= last_word_mask;
    }
}

// Horizontal 3-neighbour OR of one row.
fn dilate_row_once(src_row: &[u64], dst_row: &mut [u64], last_word_mask: u64) {
    let words = src_row.len();
    let mut prev = 0u64;
    for (w, slot) in dst_row.iter_mut().enumerate() {
        let cur = src_row[w];
        let next = if w + 1 < words { src_row[w + 1] } else { 0 };
        let left = (cur << 1) | (prev >> 63);
        let right = (cur >> 1) | (next << 63);
        *slot = cur | left | right;
        prev = cur;
    }
    if let Some(last) = dst_row.last_mut() {
        *last &= last_word_mask;
    }
}
