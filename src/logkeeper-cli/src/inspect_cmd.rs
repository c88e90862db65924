//! `logkeeper inspect`.

use anyhow::{Context, Result};

use logkeeper::{ArchiveEntry, read_entries};

use crate::cli::InspectArgs;

pub fn run(args: InspectArgs) -> Result<()> {
    let mut entries = read_entries(&args.archive)
        .with_context(|| format!("Failed to inspect {}", args.archive.display()))?;
    sort_oldest_first(&mut entries);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render_table(&entries));
    }
    Ok(())
}

/// Order entries the way eviction would consume them.
pub fn sort_oldest_first(entries: &mut [ArchiveEntry]) {
    entries.sort_by_key(|entry| (entry.modified, entry.index));
}

pub fn render_table(entries: &[ArchiveEntry]) -> String {
    let width = entries
        .iter()
        .map(|entry| entry.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!("{:>5}  {:<width$}  MODIFIED (UTC)\n", "INDEX", "NAME");
    for entry in entries {
        let modified = entry
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>5}  {:<width$}  {}\n",
            entry.index, entry.name, modified
        ));
    }
    out.push_str(&format!("{} entries\n", entries.len()));
    out
}
