//! Command-line front end for the sketch comparator.
//!
//! Everything that can fail is funnelled through [`run`]; [`output_line`] is
//! the single place where an error turns into the `0` score line.

pub mod cli;
pub mod loader;
pub mod settings;

use std::ffi::OsString;
use std::sync::Arc;

use sketch_score_comparator::{ComparisonError, ScoreReport, SketchComparator};
use sketch_score_sink::DumpSink;
use sketch_score_types::SketchRole;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, CliSources, parse_args};
use crate::loader::{LoadError, load_grayscale, require_path};
use crate::settings::{ConfigError, resolve_settings};

/// Line printed whenever no score could be computed.
pub const FAILURE_OUTPUT: &str = "0";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid arguments: {0}")]
    Cli(#[from] clap::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Comparison(#[from] ComparisonError),
}

/// Resolves settings, loads both images and scores the attempt.
pub fn run(args: &CliArgs, sources: &CliSources) -> Result<ScoreReport, RunError> {
    let settings = resolve_settings(args, sources)?;
    if let Some(path) = &settings.config_path {
        debug!(path = %path.display(), "using config file");
    }

    let reference_path = require_path(args.reference.as_deref(), SketchRole::Reference)?;
    let attempt_path = require_path(args.attempt.as_deref(), SketchRole::Attempt)?;
    let reference = load_grayscale(reference_path)?;
    let attempt = load_grayscale(attempt_path)?;

    let mut comparator = SketchComparator::new(settings.scoring)?;
    if settings.dump.is_enabled() {
        comparator = comparator.with_sink(Arc::new(DumpSink::new(settings.dump)));
    }
    let report = comparator.compare(&reference, &attempt)?;

    for metric in report.trace() {
        info!(metric = metric.name, value = metric.value, "score trace");
    }
    for adjustment in &report.breakdown.adjustments {
        info!(?adjustment, "applied");
    }
    Ok(report)
}

/// Collapses a run result into the single stdout line.
pub fn output_line(result: &Result<ScoreReport, RunError>) -> String {
    match result {
        Ok(report) => report.formatted_score(),
        Err(err) => {
            warn!(error = %err, "scoring failed; reporting 0");
            FAILURE_OUTPUT.to_string()
        }
    }
}

/// Parses `argv`, runs the comparison and returns the line to print.
/// Never fails: any error yields `"0"`.
pub fn run_to_output<I, T>(argv: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let result = parse_args(argv)
        .map_err(RunError::from)
        .and_then(|(args, sources)| run(&args, &sources));
    output_line(&result)
}
