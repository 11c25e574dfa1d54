use sketch_score_types::{BinaryMask, SketchRole};

use crate::pipeline::ScoreReport;

/// Observer for pipeline intermediates.
///
/// Implementations must not fail the comparison: any I/O error is theirs to
/// log and drop.
pub trait DiagnosticSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn binarized(&self, _role: SketchRole, _mask: &BinaryMask) {}

    fn canonical(&self, _role: SketchRole, _mask: &BinaryMask) {}

    fn report(&self, _report: &ScoreReport) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn name(&self) -> &'static str {
        "noop"
    }
}
