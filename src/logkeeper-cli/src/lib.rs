//! Logkeeper CLI.
//!
//! - `cli` - Command-line argument parsing
//! - `settings` - TOML settings file and flag merging
//! - `logging` - Tracing subscriber setup
//! - `*_cmd.rs` - Individual command implementations

pub mod cli;
pub mod inspect_cmd;
pub mod logging;
pub mod run_cmd;
pub mod settings;

use anyhow::Result;

use cli::Command;

/// Execute a parsed command.
pub fn dispatch_command(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run_cmd::run(args),
        Command::Inspect(args) => inspect_cmd::run(args),
    }
}
