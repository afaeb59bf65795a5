//! `survey`: reconcile survey metadata with responses and run analyses.

use std::io::{self, IsTerminal};

use clap::Parser;
use survey_cli::logging::init_logging;

mod cli;
mod commands;
mod summary;
mod types;

use crate::cli::{Cli, Command};
use crate::commands::{run_analyze, run_init, run_metadata, run_scripts};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = cli.log_config(io::stderr().is_terminal());
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Analyze(args) => match run_analyze(args) {
            Ok(result) => {
                print_summary(&result);
                if result.has_errors { 1 } else { 0 }
            }
            Err(error) => report(&error),
        },
        Command::Metadata(args) => run_metadata(args).map_or_else(|error| report(&error), |()| 0),
        Command::Scripts => run_scripts().map_or_else(|error| report(&error), |()| 0),
        Command::Init(args) => run_init(args).map_or_else(|error| report(&error), |()| 0),
    };
    std::process::exit(exit_code);
}

fn report(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    1
}
