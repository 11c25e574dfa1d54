use std::sync::Arc;

use sketch_score_types::{BoundingBox, GrayGrid, SketchRole};
use tracing::{debug, instrument};

use crate::binarize::binarize;
use crate::canonicalize::canonicalize;
use crate::config::ScoringConfig;
use crate::diagnostics::{DiagnosticSink, NoopSink};
use crate::error::ComparisonResult;
use crate::metrics::compute_metrics;
use crate::pipeline::ScoreReport;
use crate::scoring::score;
use crate::tolerance::{PackedMask, build_safe_zone};

/// One image after binarization, canonicalization and safe-zone dilation.
#[derive(Clone, Debug)]
pub struct PreparedSketch {
    pub role: SketchRole,
    pub bounds: BoundingBox,
    pub ink: PackedMask,
    pub safe_zone: PackedMask,
}

pub struct SketchComparator {
    config: ScoringConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl SketchComparator {
    pub fn new(config: ScoringConfig) -> ComparisonResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sink: Arc::new(NoopSink),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        debug!(sink = sink.name(), "diagnostic sink attached");
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    #[instrument(skip(self, grid), fields(width = grid.width(), height = grid.height()))]
    pub fn prepare(&self, role: SketchRole, grid: &GrayGrid) -> ComparisonResult<PreparedSketch> {
        let mask = binarize(grid, &self.config.binarize)?;
        self.sink.binarized(role, &mask);

        let canonical = canonicalize(&mask, role, &self.config.canonical)?;
        self.sink.canonical(role, &canonical.mask);

        let ink = PackedMask::from_mask(&canonical.mask);
        let safe_zone = build_safe_zone(&ink, self.config.tolerance_radius);
        Ok(PreparedSketch {
            role,
            bounds: canonical.bounds,
            ink,
            safe_zone,
        })
    }

    pub fn compare_prepared(
        &self,
        reference: &PreparedSketch,
        attempt: &PreparedSketch,
    ) -> ComparisonResult<ScoreReport> {
        let metrics = compute_metrics(
            &reference.ink,
            &reference.safe_zone,
            &attempt.ink,
            &attempt.safe_zone,
        )?;
        let breakdown = score(&metrics, &self.config.weights);
        let report = ScoreReport {
            reference_bounds: reference.bounds,
            attempt_bounds: attempt.bounds,
            reference_ink: reference.ink.count_ones(),
            attempt_ink: attempt.ink.count_ones(),
            metrics,
            breakdown,
        };
        debug!(
            precision = report.metrics.precision,
            recall = report.metrics.recall,
            ink_ratio = report.metrics.ink_ratio,
            score = report.score(),
            "comparison finished"
        );
        self.sink.report(&report);
        Ok(report)
    }

    /// Runs the whole pipeline on a reference and an attempt.
    pub fn compare(&self, reference: &GrayGrid, attempt: &GrayGrid) -> ComparisonResult<ScoreReport> {
        let reference = self.prepare(SketchRole::Reference, reference)?;
        let attempt = self.prepare(SketchRole::Attempt, attempt)?;
        self.compare_prepared(&reference, &attempt)
    }
}
