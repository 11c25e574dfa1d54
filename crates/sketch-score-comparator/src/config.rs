use crate::error::{ComparisonError, ComparisonResult};

pub const DEFAULT_CANONICAL_SIZE: usize = 300;
pub const DEFAULT_TOLERANCE_RADIUS: usize = 8;
pub const DEFAULT_MIN_CONTENT_SIZE: usize = 10;

/// Largest accepted canonical side length.
pub const MAX_CANONICAL_SIZE: usize = 4096;
/// Largest accepted CLAHE grid dimension.
pub const MAX_CLAHE_TILES: usize = 64;
/// Largest accepted blur kernel or adaptive block size.
pub const MAX_KERNEL_SIZE: usize = 255;

/// Every tunable of the scoring pipeline, injected once into the comparator.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringConfig {
    pub binarize: BinarizeConfig,
    pub canonical: CanonicalConfig,
    /// Safe-zone disk radius in canonical pixels.
    pub tolerance_radius: usize,
    pub weights: ScoreWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            binarize: BinarizeConfig::default(),
            canonical: CanonicalConfig::default(),
            tolerance_radius: DEFAULT_TOLERANCE_RADIUS,
            weights: ScoreWeights::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> ComparisonResult<()> {
        self.binarize.validate()?;
        self.canonical.validate()?;
        if self.tolerance_radius >= self.canonical.canonical_size {
            return Err(ComparisonError::invalid_config(
                "tolerance_radius",
                self.tolerance_radius,
            ));
        }
        self.weights.validate()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinarizeConfig {
    pub clahe_clip_limit: f64,
    pub clahe_tiles: usize,
    pub blur_kernel: usize,
    pub adaptive_block_size: usize,
    pub adaptive_offset: f64,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
            blur_kernel: 5,
            adaptive_block_size: 41,
            adaptive_offset: 10.0,
        }
    }
}

impl BinarizeConfig {
    fn validate(&self) -> ComparisonResult<()> {
        if !(self.clahe_clip_limit.is_finite() && self.clahe_clip_limit >= 0.0) {
            return Err(ComparisonError::invalid_config(
                "binarize.clahe_clip_limit",
                self.clahe_clip_limit,
            ));
        }
        if self.clahe_tiles == 0 || self.clahe_tiles > MAX_CLAHE_TILES {
            return Err(ComparisonError::invalid_config(
                "binarize.clahe_tiles",
                self.clahe_tiles,
            ));
        }
        if self.blur_kernel % 2 == 0 || self.blur_kernel > MAX_KERNEL_SIZE {
            return Err(ComparisonError::invalid_config(
                "binarize.blur_kernel",
                self.blur_kernel,
            ));
        }
        if self.adaptive_block_size < 3
            || self.adaptive_block_size % 2 == 0
            || self.adaptive_block_size > MAX_KERNEL_SIZE
        {
            return Err(ComparisonError::invalid_config(
                "binarize.adaptive_block_size",
                self.adaptive_block_size,
            ));
        }
        if !self.adaptive_offset.is_finite() {
            return Err(ComparisonError::invalid_config(
                "binarize.adaptive_offset",
                self.adaptive_offset,
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalConfig {
    /// Side length of the square canonical mask.
    pub canonical_size: usize,
    /// Minimum width and height of the ink bounding box.
    pub min_content_size: usize,
    pub rebinarize_threshold: u8,
    /// Side of the square element used to restore stroke thickness.
    pub thickness_kernel: usize,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            canonical_size: DEFAULT_CANONICAL_SIZE,
            min_content_size: DEFAULT_MIN_CONTENT_SIZE,
            rebinarize_threshold: 127,
            thickness_kernel: 2,
        }
    }
}

impl CanonicalConfig {
    fn validate(&self) -> ComparisonResult<()> {
        if self.canonical_size == 0 || self.canonical_size > MAX_CANONICAL_SIZE {
            return Err(ComparisonError::invalid_config(
                "canonical_size",
                self.canonical_size,
            ));
        }
        if self.min_content_size == 0 {
            return Err(ComparisonError::invalid_config(
                "min_content_size",
                self.min_content_size,
            ));
        }
        Ok(())
    }
}

/// Constants of the scoring formula.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreWeights {
    /// Ink ratio above which over-drawing is penalized.
    pub efficiency_ratio: f64,
    /// Precision below which the score is scaled down.
    pub messiness_threshold: f64,
    /// Precision above which the completeness bonus applies.
    pub bonus_precision_threshold: f64,
    pub bonus_weight: f64,
    /// Running score above which the completion curve applies.
    pub completion_threshold: f64,
    pub completion_exponent: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            efficiency_ratio: 1.5,
            messiness_threshold: 0.5,
            bonus_precision_threshold: 0.85,
            bonus_weight: 0.15,
            completion_threshold: 0.85,
            completion_exponent: 0.5,
        }
    }
}

impl ScoreWeights {
    fn validate(&self) -> ComparisonResult<()> {
        let positive = [
            ("scoring.efficiency_ratio", self.efficiency_ratio),
            ("scoring.messiness_threshold", self.messiness_threshold),
            ("scoring.completion_exponent", self.completion_exponent),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ComparisonError::invalid_config(field, value));
            }
        }
        let non_negative = [
            (
                "scoring.bonus_precision_threshold",
                self.bonus_precision_threshold,
            ),
            ("scoring.bonus_weight", self.bonus_weight),
            ("scoring.completion_threshold", self.completion_threshold),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ComparisonError::invalid_config(field, value));
            }
        }
        Ok(())
    }
}
