use std::error::Error;

use sketch_score_comparator::{ScoringConfig, SketchComparator};
use sketch_score_types::{GrayGrid, SketchRole};

const CANVAS: usize = 320;
const RADIUS: f64 = 110.0;
const STROKE: f64 = 5.0;
// Attempt centre offsets to sweep, in source pixels.
const OFFSETS: [(f64, f64); 4] = [(0.0, 0.0), (3.0, -3.0), (12.0, 0.0), (0.0, 40.0)];

fn ring(cx: f64, cy: f64, radius: f64) -> GrayGrid {
    GrayGrid::from_fn(CANVAS, CANVAS, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        if ((dx * dx + dy * dy).sqrt() - radius).abs() <= STROKE / 2.0 {
            20
        } else {
            240
        }
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let comparator = SketchComparator::new(ScoringConfig::default())?;
    let center = CANVAS as f64 / 2.0;
    let reference = ring(center, center, RADIUS);
    let prepared_reference = comparator.prepare(SketchRole::Reference, &reference)?;

    println!("Canvas          : {CANVAS}x{CANVAS}");
    println!("Reference ring  : r={RADIUS} stroke={STROKE}");
    println!(
        "Tolerance       : {} px in {}x{} canonical space",
        comparator.config().tolerance_radius,
        comparator.config().canonical.canonical_size,
        comparator.config().canonical.canonical_size
    );

    for (dx, dy) in OFFSETS {
        // Shrink the attempt as it drifts so the bounding box actually changes shape.
        let radius = RADIUS - dy.abs() / 2.0;
        let attempt = ring(center + dx, center + dy, radius);
        let prepared = comparator.prepare(SketchRole::Attempt, &attempt)?;
        let report = comparator.compare_prepared(&prepared_reference, &prepared)?;
        println!(
            "offset=({dx:>5.1},{dy:>5.1}) r={radius:>6.1}  precision={:.4} recall={:.4} ink_ratio={:.4} score={}",
            report.metrics.precision,
            report.metrics.recall,
            report.metrics.ink_ratio,
            report.formatted_score()
        );
        for adjustment in &report.breakdown.adjustments {
            println!("    {adjustment:?}");
        }
    }
    Ok(())
}
