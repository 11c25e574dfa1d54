use sketch_score_types::{BinaryMask, GrayGrid};
use tracing::debug;

use crate::config::BinarizeConfig;
use crate::error::ComparisonResult;
use crate::pipeline::ops::{Border, adaptive_threshold_inv, clahe, gaussian_blur};

/// Converts a grayscale grid into an ink mask.
///
/// Local contrast is equalized first so that shadows and uneven scans do not
/// swamp the adaptive threshold. The result is flipped when ink covers more
/// than half of the image, so ink is always the sparse class.
pub fn binarize(grid: &GrayGrid, config: &BinarizeConfig) -> ComparisonResult<BinaryMask> {
    let width = grid.width();
    let height = grid.height();
    if grid.is_empty() {
        return Ok(BinaryMask::new(width, height));
    }

    let enhanced = clahe(
        grid.data(),
        width,
        height,
        config.clahe_tiles,
        config.clahe_tiles,
        config.clahe_clip_limit,
    );
    let blurred = gaussian_blur(
        &enhanced,
        width,
        height,
        config.blur_kernel,
        0.0,
        Border::Reflect101,
    );
    let thresholded = adaptive_threshold_inv(
        &blurred,
        width,
        height,
        config.adaptive_block_size,
        config.adaptive_offset,
    );

    let mut mask = BinaryMask::from_owned(width, height, thresholded)?;
    correct_polarity(&mut mask);
    Ok(mask)
}

/// Inverts `mask` when ink covers more than half of it. Returns whether it flipped.
pub fn correct_polarity(mask: &mut BinaryMask) -> bool {
    let ink = mask.ink_count();
    let total = mask.len();
    if ink * 2 > total {
        debug!(ink, total, "ink covers the majority; inverting polarity");
        mask.invert_in_place();
        return true;
    }
    false
}
