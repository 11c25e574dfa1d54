//! Sketch comparison pipeline.
//!
//! Each image is binarized, mapped to a square canonical space, and dilated
//! into a tolerance zone. Precision and recall are measured against the other
//! image's zone and folded into a single grade by [`scoring::score`].

pub mod binarize;
pub mod canonicalize;
pub mod comparator;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod scoring;
pub mod tolerance;

pub use comparator::{PreparedSketch, SketchComparator};
pub use config::{BinarizeConfig, CanonicalConfig, ScoreWeights, ScoringConfig};
pub use diagnostics::{DiagnosticSink, NoopSink};
pub use error::{ComparisonError, ComparisonResult};
pub use metrics::MetricTriple;
pub use pipeline::{ReportMetric, ScoreReport};
pub use scoring::{Adjustment, ScoreBreakdown};
