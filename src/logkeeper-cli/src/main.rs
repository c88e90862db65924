//! Logkeeper CLI - main entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use logkeeper_cli::cli::Cli;
use logkeeper_cli::dispatch_command;
use logkeeper_cli::logging::setup_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.log_level, cli.json_logs);

    if let Err(e) = dispatch_command(cli.command) {
        error!("{:#}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
