//! `clearance` -- command-line entry point
//!
//! Parses arguments, initialises logging from the `[general]` section and
//! dispatches to one handler per subcommand. Failures map to the exit codes
//! documented on [`CliError::exit_code`](error::CliError::exit_code).

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use clearance_core::config::ClearanceConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

fn main() {
    let cli = Cli::parse();
    let writer = OutputWriter::new(cli.output);

    let code = match run(cli, &writer) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    // 설정이 잘못되어도 로깅은 기본값으로 시작
    let mut general = ClearanceConfig::load(&cli.config)
        .map(|c| c.general)
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    logging::init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))?;

    tracing::debug!(config = %cli.config.display(), "clearance starting");

    match cli.command {
        Commands::Curate(args) => commands::curate::execute(args, &cli.config, writer),
        Commands::Rules(args) => commands::rules::execute(args, &cli.config, writer),
        Commands::Archive(args) => commands::archive::execute(args, &cli.config, writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, writer),
    }
}
