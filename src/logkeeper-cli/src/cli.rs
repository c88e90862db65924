//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Rotate aging log files into a size-bounded zip archive.
#[derive(Debug, Parser)]
#[command(name = "logkeeper")]
#[command(version)]
pub struct Cli {
    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Archive or delete log files older than the age threshold
    Run(RunArgs),

    /// List the entries of an archive, oldest first
    Inspect(InspectArgs),
}

/// Arguments for `logkeeper run`.
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// TOML file with keeper settings; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Glob selecting log files, or a directory (selects `*.log` inside it)
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Minimum age of rotated files, e.g. "1 month" or "2 weeks"
    #[arg(short, long)]
    pub age: Option<String>,

    /// Archive file name, relative to each log file's directory
    #[arg(long)]
    pub archive_name: Option<String>,

    /// Maximum archive entries: -1 keeps everything, 0 deletes instead of archiving
    #[arg(long, allow_hyphen_values = true)]
    pub max_entries: Option<i64>,

    /// Skip files whose archive cannot be opened instead of stopping
    #[arg(long)]
    pub skip_archive_errors: bool,
}

/// Arguments for `logkeeper inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Archive to list
    pub archive: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors
    Warn,
    /// Show informational messages, warnings, and errors (default)
    #[default]
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "logkeeper",
            "--log-level",
            "debug",
            "run",
            "--pattern",
            "/var/log/app",
            "--age",
            "1 month",
            "--max-entries",
            "-1",
        ])
        .unwrap();

        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.pattern.as_deref(), Some("/var/log/app"));
                assert_eq!(args.age.as_deref(), Some("1 month"));
                assert_eq!(args.max_entries, Some(-1));
                assert!(!args.skip_archive_errors);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["logkeeper", "inspect", "old.zip", "--json"]).unwrap();
        match cli.command {
            Command::Inspect(args) => {
                assert_eq!(args.archive, PathBuf::from("old.zip"));
                assert!(args.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["logkeeper"]).is_err());
    }

    #[test]
    fn test_log_level_filter_strings() {
        assert_eq!(LogLevel::default().as_filter_str(), "info");
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
    }
}
