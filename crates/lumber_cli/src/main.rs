//! `lumber` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration once and hand it to command handlers.
//! - Map handler failures to stderr messages and exit codes.

mod args;
mod commands;

use args::Cli;
use clap::Parser;
use lumber_core::{init_logging_from_config, LumberConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match LumberConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(commands::EXIT_SETUP_ERROR);
        }
    };
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    if let Some(token) = cli.token.clone() {
        config.token = Some(token);
    }

    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let mut stdout = std::io::stdout().lock();
    match commands::run(&cli.command, &config, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lumber: {}: {err}", err.label());
            ExitCode::from(err.exit_code())
        }
    }
}
