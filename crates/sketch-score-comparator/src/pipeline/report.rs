use serde::Serialize;
use sketch_score_types::BoundingBox;

use crate::metrics::MetricTriple;
use crate::scoring::ScoreBreakdown;

/// Named scalar used for the textual trace.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ReportMetric {
    pub name: &'static str,
    pub value: f64,
}

/// Everything one comparison produced, ready to be logged or serialized.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreReport {
    pub reference_bounds: BoundingBox,
    pub attempt_bounds: BoundingBox,
    /// Canonical ink pixel counts.
    pub reference_ink: usize,
    pub attempt_ink: usize,
    pub metrics: MetricTriple,
    pub breakdown: ScoreBreakdown,
}

impl ScoreReport {
    pub fn score(&self) -> f64 {
        self.breakdown.score
    }

    /// Score formatted the way the command line prints it.
    pub fn formatted_score(&self) -> String {
        format!("{:.4}", self.score())
    }

    pub fn trace(&self) -> Vec<ReportMetric> {
        vec![
            ReportMetric {
                name: "precision",
                value: self.metrics.precision,
            },
            ReportMetric {
                name: "recall",
                value: self.metrics.recall,
            },
            ReportMetric {
                name: "ink_ratio",
                value: self.metrics.ink_ratio,
            },
            ReportMetric {
                name: "score",
                value: self.score(),
            },
        ]
    }
}
