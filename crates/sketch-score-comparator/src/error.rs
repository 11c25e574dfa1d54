use sketch_score_types::{BoundingBox, MaskError, SketchRole};
use thiserror::Error;

pub type ComparisonResult<T> = Result<T, ComparisonError>;

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("{role} image has no usable ink content (bounds {bounds:?})")]
    NoUsableContent {
        role: SketchRole,
        bounds: Option<BoundingBox>,
    },

    #[error(
        "mask dimensions differ: {left_width}x{left_height} vs {right_width}x{right_height}"
    )]
    DimensionMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },

    #[error("invalid scoring configuration: {field} = {value}")]
    InvalidConfig { field: &'static str, value: String },

    #[error(transparent)]
    Mask(#[from] MaskError),
}

impl ComparisonError {
    pub fn invalid_config(field: &'static str, value: impl ToString) -> Self {
        ComparisonError::InvalidConfig {
            field,
            value: value.to_string(),
        }
    }
}
