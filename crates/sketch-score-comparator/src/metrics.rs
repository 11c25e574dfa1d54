use serde::Serialize;

use crate::error::ComparisonResult;
use crate::tolerance::PackedMask;

/// Overlap statistics of two canonical masks.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct MetricTriple {
    /// Share of attempt ink inside the reference safe zone.
    pub precision: f64,
    /// Share of reference ink inside the attempt safe zone.
    pub recall: f64,
    /// Attempt ink divided by reference ink.
    pub ink_ratio: f64,
}

/// Computes precision, recall and ink ratio. Denominators are floored at one
/// so empty masks produce zeros rather than NaN.
pub fn compute_metrics(
    reference: &PackedMask,
    reference_zone: &PackedMask,
    attempt: &PackedMask,
    attempt_zone: &PackedMask,
) -> ComparisonResult<MetricTriple> {
    let reference_ink = reference.count_ones();
    let attempt_ink = attempt.count_ones();
    let hits = attempt.intersection_count(reference_zone)?;
    let covered = reference.intersection_count(attempt_zone)?;

    Ok(MetricTriple {
        precision: hits as f64 / attempt_ink.max(1) as f64,
        recall: covered as f64 / reference_ink.max(1) as f64,
        ink_ratio: attempt_ink as f64 / reference_ink.max(1) as f64,
    })
}
