//! Run orchestrator.
//!
//! A run computes the cutoff instant, streams candidates through the
//! eligibility selector and rotates each eligible file as it is found:
//! 1. capacity disabled: delete the file, no archive I/O
//! 2. otherwise: open the directory's archive, evict, add, close, delete

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{Dispatch, debug, warn};

use crate::archive::ArchiveHandle;
use crate::config::{ArchiveErrorPolicy, KeeperConfig};
use crate::discovery::CandidateStream;
use crate::error::{KeeperError, Result};
use crate::selector::EligibilitySelector;

/// What happened to one eligible file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    Archived,
    Deleted,
    Skipped,
}

#[derive(Debug, Default)]
struct RunTally {
    archived: usize,
    deleted: usize,
    skipped: usize,
}

impl RunTally {
    fn record(&mut self, rotation: Rotation) {
        match rotation {
            Rotation::Archived => self.archived += 1,
            Rotation::Deleted => self.deleted += 1,
            Rotation::Skipped => self.skipped += 1,
        }
    }
}

/// Rotates aging log files into per-directory archives.
pub struct LogKeeper {
    config: KeeperConfig,
    dispatch: Option<Dispatch>,
}

impl LogKeeper {
    pub fn new(config: KeeperConfig) -> Self {
        Self {
            config,
            dispatch: None,
        }
    }

    /// Send this keeper's events to `dispatch` instead of the process-wide
    /// subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// Run once against the current time.
    pub fn run(&self) -> Result<()> {
        self.run_at(Utc::now())
    }

    /// Run once as if the current time were `now`.
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<()> {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, || self.keep(now)),
            None => self.keep(now),
        }
    }

    /// Archive path used for a log file: the configured name resolved
    /// against the file's directory.
    pub fn archive_path_for(&self, log_file: &Path) -> PathBuf {
        log_file
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(self.config.archive_name())
    }

    /// Whether `path` is an archive this keeper writes: any path ending with
    /// the configured archive name, whichever directory it sits in.
    pub fn is_archive_path(&self, path: &Path) -> bool {
        path.ends_with(self.config.archive_name())
    }

    fn keep(&self, now: DateTime<Utc>) -> Result<()> {
        let cutoff = self.config.age_threshold().cutoff(now);
        let selector = EligibilitySelector::new(cutoff);

        debug!(
            pattern = %self.config.selection_pattern(),
            cutoff = %cutoff,
            max_archive_entries = %self.config.max_archive_entries(),
            "Starting log keeping"
        );

        let candidates = CandidateStream::new(self.config.selection_pattern())?;
        let mut tally = RunTally::default();

        for path in candidates
            .filter(|path| !self.is_archive_path(path))
            .filter(|path| selector.accepts(path))
        {
            tally.record(self.rotate(&path)?);
        }

        debug!(
            archived = tally.archived,
            deleted = tally.deleted,
            skipped = tally.skipped,
            "Log keeping has been completed"
        );
        Ok(())
    }

    fn rotate(&self, path: &Path) -> Result<Rotation> {
        if self.config.max_archive_entries().is_disabled() {
            remove_source(path)?;
            return Ok(Rotation::Deleted);
        }

        let archive_path = self.archive_path_for(path);
        match self.archive(path, &archive_path) {
            Ok(rotation) => Ok(rotation),
            Err(e) if e.is_archive_access() => {
                warn!(
                    path = %path.display(),
                    archive = %archive_path.display(),
                    error = %e,
                    "Could not open archive"
                );
                match self.config.archive_error_policy() {
                    ArchiveErrorPolicy::Skip => Ok(Rotation::Skipped),
                    ArchiveErrorPolicy::Abort => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn archive(&self, path: &Path, archive_path: &Path) -> Result<Rotation> {
        let mut archive = ArchiveHandle::open_or_create(archive_path)?;
        archive.enforce_capacity(self.config.max_archive_entries());

        match archive.add_entry(path) {
            Ok(_) => {}
            Err(KeeperError::SourceUnavailable { source, .. }) => {
                // Pending evictions are discarded with the handle.
                debug!(path = %path.display(), error = %source, "Log file unavailable for archiving");
                return Ok(Rotation::Skipped);
            }
            Err(e) => return Err(e),
        }

        archive.close()?;
        remove_source(path)?;
        Ok(Rotation::Archived)
    }
}

/// Delete a rotated log file. A file that is already gone is not an error.
fn remove_source(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed log file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(KeeperError::RemoveSource {
            path: path.to_path_buf(),
            source,
        }),
    }
}
