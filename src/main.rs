//! Run a conformance script.
//!
//! Usage: `wastref <script.json> [--verbose] [--keep-going] [--max-call-depth N]`
//!
//! Exits with status 0 when every assertion passed, 1 when an assertion
//! failed and 2 when the script could not be run at all.

use clap::Parser;
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;

use wastref::runtime::Config;
use wastref::wast::{Report, Script, ScriptError, ScriptRunner};

#[derive(Parser, Debug)]
#[command(name = "wastref")]
#[command(about = "Run a WebAssembly conformance script against the reference interpreter")]
struct Args {
    /// Path to the JSON script
    script: PathBuf,

    /// Log every command
    #[arg(short, long)]
    verbose: bool,

    /// Keep running after a failed assertion
    #[arg(long = "keep-going")]
    keep_going: bool,

    /// Nested calls allowed before trapping
    #[arg(long = "max-call-depth", default_value_t = Config::default().max_call_depth)]
    max_call_depth: usize,
}

fn run(args: Args) -> Result<Report, ScriptError> {
    let script = Script::from_path(&args.script)?;
    info!("{}: {} commands", args.script.display(), script.commands.len());
    let mut runner = ScriptRunner::new(Config {
        max_call_depth: args.max_call_depth,
        keep_going: args.keep_going,
    })?;
    runner.run(&script)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    match run(args) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            for failure in &report.failures {
                error!("#{}: {}", failure.index, failure.message);
            }
            ExitCode::from(1)
        }
        Err(e @ ScriptError::AssertionFailed { .. }) => {
            error!("{e}");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}
