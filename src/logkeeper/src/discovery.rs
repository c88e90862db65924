//! Candidate discovery: glob expansion and file metadata.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::DIRECTORY_LOG_GLOB;
use crate::error::{KeeperError, Result};

/// Expand a selection pattern into a glob.
///
/// A pattern naming an existing directory selects the `*.log` files directly
/// inside it; anything else is used as-is.
pub fn selection_glob(pattern: &str) -> String {
    let path = Path::new(pattern);
    if !path.is_dir() {
        return pattern.to_string();
    }

    let dir = glob::Pattern::escape(pattern.trim_end_matches(std::path::MAIN_SEPARATOR));
    format!("{}{}{}", dir, std::path::MAIN_SEPARATOR, DIRECTORY_LOG_GLOB)
}

/// Lazily yields the paths matched by a selection pattern.
///
/// Paths come out in the order the glob walker produces them (alphabetical
/// per directory). Entries the walker cannot read are skipped.
pub struct CandidateStream {
    paths: glob::Paths,
}

impl CandidateStream {
    pub fn new(pattern: &str) -> Result<Self> {
        let expanded = selection_glob(pattern);
        let paths = glob::glob(&expanded).map_err(|source| KeeperError::InvalidPattern {
            pattern: expanded.clone(),
            source,
        })?;
        Ok(Self { paths })
    }
}

impl Iterator for CandidateStream {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.paths.next()? {
                Ok(path) => return Some(path),
                Err(e) => {
                    debug!(path = %e.path().display(), error = %e.error(), "Skipping unreadable candidate");
                }
            }
        }
    }
}

/// Metadata of a candidate path, following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_file: bool,
    pub modified: DateTime<Utc>,
}

impl FileStat {
    /// Stat a path. Missing or unreadable paths yield `None`.
    pub fn probe(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        let modified = metadata.modified().ok()?;
        Some(Self {
            is_file: metadata.is_file(),
            modified: DateTime::<Utc>::from(modified),
        })
    }
}
