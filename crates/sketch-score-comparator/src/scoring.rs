use serde::Serialize;
use tracing::debug;

use crate::config::ScoreWeights;
use crate::metrics::MetricTriple;

/// One step of the scoring chain that changed the running score.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    Efficiency { factor: f64 },
    Messiness { factor: f64 },
    PrecisionBonus { factor: f64 },
    CompletionCurve { before: f64, after: f64 },
    Clamp { before: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Running score before any adjustment (the recall).
    pub baseline: f64,
    pub adjustments: Vec<Adjustment>,
    pub score: f64,
}

/// Folds the metric triple into a single grade in `[0, 1]`.
///
/// Penalties run before the bonus, and the completion curve runs last, so the
/// curve only ever compresses scores that survived the penalties.
pub fn score(metrics: &MetricTriple, weights: &ScoreWeights) -> ScoreBreakdown {
    let baseline = metrics.recall;
    let mut running = baseline;
    let mut adjustments = Vec::new();

    let efficiency = weights.efficiency_ratio / weights.efficiency_ratio.max(metrics.ink_ratio);
    if efficiency < 1.0 {
        running *= efficiency;
        adjustments.push(Adjustment::Efficiency { factor: efficiency });
    }

    if metrics.precision < weights.messiness_threshold {
        let factor = metrics.precision / weights.messiness_threshold;
        running *= factor;
        adjustments.push(Adjustment::Messiness { factor });
    }

    if metrics.precision > weights.bonus_precision_threshold {
        let factor = 1.0 + weights.bonus_weight * metrics.recall;
        running *= factor;
        adjustments.push(Adjustment::PrecisionBonus { factor });
    }

    if running > weights.completion_threshold {
        let after = running.powf(weights.completion_exponent);
        adjustments.push(Adjustment::CompletionCurve {
            before: running,
            after,
        });
        running = after;
    }

    if running > 1.0 {
        adjustments.push(Adjustment::Clamp { before: running });
        running = 1.0;
    }

    for adjustment in &adjustments {
        debug!(?adjustment, "score adjustment");
    }

    ScoreBreakdown {
        baseline,
        adjustments,
        score: running,
    }
}
