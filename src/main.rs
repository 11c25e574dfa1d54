use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use sketch_score::cli::parse_args;
use sketch_score::{RunError, output_line, run};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let parsed = parse_args(std::env::args_os());
    let verbose = parsed.as_ref().is_ok_and(|(args, _)| args.verbose);
    init_tracing(verbose);

    let line = match parsed {
        Ok((args, sources)) => output_line(&run(&args, &sources)),
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            err.exit()
        }
        Err(err) => output_line(&Err(RunError::Cli(err))),
    };
    println!("{line}");
}
