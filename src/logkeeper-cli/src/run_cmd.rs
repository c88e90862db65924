//! `logkeeper run`.

use anyhow::{Context, Result};
use tracing::info;

use logkeeper::LogKeeper;

use crate::cli::RunArgs;
use crate::settings::resolve_config;

pub fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    info!(
        pattern = %config.selection_pattern(),
        age = %config.age_threshold(),
        archive = %config.archive_name(),
        max_entries = %config.max_archive_entries(),
        "Rotating log files"
    );

    LogKeeper::new(config)
        .run()
        .context("Log keeping run failed")?;

    info!("Log rotation finished");
    Ok(())
}
