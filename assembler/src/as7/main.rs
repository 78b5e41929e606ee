use std::path::PathBuf;

use clap::Parser;
use tracing::{event, span, Level};
use tracing_subscriber::prelude::*;

use assembler::{assemble_files, Fail, OutputFormat, OutputOptions};

/// Assembler for the PDP-7, in the notation of first-edition Unix
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// Enable internal tracing
    #[clap(short = 'd', long)]
    debug: bool,

    /// Output format: a7out, list, ptr or rim
    #[clap(short = 'f', long, default_value = "a7out")]
    format: OutputFormat,

    /// Also write a name-list file next to the output
    #[clap(short = 'n', long)]
    namelist: bool,

    /// File to which assembler output is written
    #[clap(short = 'o', long, default_value = "a.out")]
    output: PathBuf,

    /// Files containing assembly source code
    #[clap(required = true)]
    input: Vec<PathBuf>,
}

fn run_assembler() -> Result<(), Fail> {
    let cli = Cli::parse();

    // RUST_LOG still wins; --debug only moves the default floor.  See
    // https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/index.html#filtering-events-with-environment-variables
    // for how to select which trace messages get printed.
    let default_filter = if cli.debug { "debug" } else { "info" };
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_filter))
    {
        Err(e) => {
            return Err(Fail::InitialisationFailure(format!(
                "failed to initialise tracing filter (perhaps there is a problem with environment variables): {e}"
            )));
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let options = OutputOptions {
        format: cli.format,
        namelist: cli.namelist,
    };
    let span = span!(Level::ERROR, "assemble", output = ?cli.output);
    let _enter = span.enter();
    let result = assemble_files(&cli.input, &cli.output, options).map_err(Fail::AsmFail);
    if let Err(e) = &result {
        event!(Level::ERROR, "assembly failed: {:?}", e);
    } else {
        event!(Level::INFO, "assembly succeeded");
    }
    result
}

fn main() {
    match run_assembler() {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
