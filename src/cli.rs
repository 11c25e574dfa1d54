use std::ffi::OsString;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use sketch_score_sink::{DEFAULT_JPEG_QUALITY, ImageOutputFormat};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DumpFormat {
    Png,
    Jpeg,
    Webp,
}

impl From<DumpFormat> for ImageOutputFormat {
    fn from(value: DumpFormat) -> Self {
        match value {
            DumpFormat::Png => ImageOutputFormat::Png,
            DumpFormat::Jpeg => ImageOutputFormat::Jpeg {
                quality: DEFAULT_JPEG_QUALITY,
            },
            DumpFormat::Webp => ImageOutputFormat::Webp,
        }
    }
}

#[derive(Debug, Default)]
pub struct CliSources {
    pub dump_format_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            dump_format_from_cli: value_from_cli(matches, "dump_format"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

/// Parses `argv` (program name first) without exiting the process.
pub fn parse_args<I, T>(argv: I) -> Result<(CliArgs, CliSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = CliArgs::command().try_get_matches_from(argv)?;
    let args = CliArgs::from_arg_matches(&matches)?;
    let sources = CliSources::from_matches(&matches);
    Ok((args, sources))
}

#[derive(Debug, Parser)]
#[command(
    name = "sketch-score",
    version,
    about = "Score how closely a freehand drawing matches a reference sketch",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Output directory for binarized and canonical mask images
    #[arg(long = "dump-dir")]
    pub dump_dir: Option<PathBuf>,

    /// Image format for dumped masks when --dump-dir is set
    #[arg(long = "dump-format", value_enum, default_value_t = DumpFormat::Png)]
    pub dump_format: DumpFormat,

    /// Write the full score report as JSON
    #[arg(long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Side length of the canonical comparison square
    #[arg(
        long = "canonical-size",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub canonical_size: Option<u32>,

    /// Stroke tolerance radius in canonical pixels
    #[arg(long = "tolerance-radius", value_parser = clap::value_parser!(u32))]
    pub tolerance_radius: Option<u32>,

    /// Minimum ink bounding-box side, in source pixels
    #[arg(
        long = "min-content-size",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub min_content_size: Option<u32>,

    /// Emit debug-level diagnostics on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Reference sketch image
    pub reference: Option<PathBuf>,

    /// Attempted drawing image
    pub attempt: Option<PathBuf>,
}
