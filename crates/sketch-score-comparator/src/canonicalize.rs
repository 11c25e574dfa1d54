use sketch_score_types::{BinaryMask, BoundingBox, SketchRole};
use tracing::debug;

use crate::config::CanonicalConfig;
use crate::error::{ComparisonError, ComparisonResult};
use crate::pipeline::ops::{dilate_rect, resize_area, threshold_binary};

/// A mask mapped into the square canonical space.
#[derive(Clone, Debug)]
pub struct CanonicalSketch {
    /// Ink bounds in the source mask's coordinates.
    pub bounds: BoundingBox,
    pub mask: BinaryMask,
}

/// Crops the ink bounding box and stretches it to `canonical_size` squared.
///
/// The aspect ratio is intentionally not preserved. Strokes thinned by
/// resampling are thickened again with a small square dilation.
pub fn canonicalize(
    mask: &BinaryMask,
    role: SketchRole,
    config: &CanonicalConfig,
) -> ComparisonResult<CanonicalSketch> {
    let bounds = mask.bounding_box();
    let bounds = match bounds {
        Some(b) if b.min_side() >= config.min_content_size => b,
        _ => {
            debug!(%role, ?bounds, "ink content too small to compare");
            return Err(ComparisonError::NoUsableContent { role, bounds });
        }
    };

    let cropped = mask.crop(bounds)?;
    let size = config.canonical_size;
    let resized = resize_area(cropped.data(), bounds.width, bounds.height, size, size);
    let binary = threshold_binary(&resized, config.rebinarize_threshold);
    let thick = dilate_rect(
        &binary,
        size,
        size,
        config.thickness_kernel,
        config.thickness_kernel,
        1,
    );
    let mask = BinaryMask::from_owned(size, size, thick)?;
    debug!(%role, ?bounds, ink = mask.ink_count(), "canonicalized sketch");
    Ok(CanonicalSketch { bounds, mask })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CanonicalConfig {
        CanonicalConfig::default()
    }

    #[test]
    fn empty_mask_has_no_content() {
        let err = canonicalize(&BinaryMask::new(50, 50), SketchRole::Attempt, &config()).unwrap_err();
        assert!(matches!(
            err,
            ComparisonError::NoUsableContent {
                role: SketchRole::Attempt,
                bounds: None
            }
        ));
    }

    #[test]
    fn thin_line_is_rejected() {
        let mask = BinaryMask::from_fn(100, 100, |x, y| y == 50 && (10..90).contains(&x));
        let err = canonicalize(&mask, SketchRole::Reference, &config()).unwrap_err();
        match err {
            ComparisonError::NoUsableContent { bounds: Some(b), .. } => {
                assert_eq!(b.height, 1);
                assert_eq!(b.width, 80);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn box_exactly_min_size_is_accepted() {
        let mask = BinaryMask::from_fn(40, 40, |x, y| (5..15).contains(&x) && (20..30).contains(&y));
        let sketch = canonicalize(&mask, SketchRole::Reference, &config()).unwrap();
        assert_eq!(sketch.bounds.width, 10);
        assert_eq!(sketch.mask.width(), 300);
        assert_eq!(sketch.mask.height(), 300);
        assert_eq!(sketch.mask.ink_count(), 300 * 300);
    }

    #[test]
    fn output_is_independent_of_position() {
        let small = BinaryMask::from_fn(200, 200, |x, y| {
            (20..70).contains(&x) && (30..80).contains(&y) && (x == 20 || y == 30 || x == 69 || y == 79)
        });
        let shifted = BinaryMask::from_fn(200, 200, |x, y| {
            (120..170).contains(&x) && (110..160).contains(&y) && (x == 120 || y == 110 || x == 169 || y == 159)
        });
        let a = canonicalize(&small, SketchRole::Reference, &config()).unwrap();
        let b = canonicalize(&shifted, SketchRole::Attempt, &config()).unwrap();
        assert_eq!(a.mask, b.mask);
    }

    #[test]
    fn outline_touches_all_four_canonical_edges() {
        let mask = BinaryMask::from_fn(64, 32, |x, y| {
            (4..60).contains(&x) && (4..28).contains(&y) && (x == 4 || y == 4 || x == 59 || y == 27)
        });
        let sketch = canonicalize(&mask, SketchRole::Reference, &config()).unwrap();
        let m = &sketch.mask;
        assert!(m.is_ink(150, 0));
        assert!(m.is_ink(150, 299));
        assert!(m.is_ink(0, 150));
        assert!(m.is_ink(299, 150));
        assert!(!m.is_ink(150, 150));
    }
}
