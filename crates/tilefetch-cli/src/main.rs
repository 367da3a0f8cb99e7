use clap::Parser;
use std::process::ExitCode;
use tilefetch_core::logging;

mod cli;

use crate::cli::Cli;

fn main() -> ExitCode {
    // Usage errors exit here, before any file I/O.
    let cli = Cli::parse();

    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr only: {:#}", err);
    }

    match cli.run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("tilefetch error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
