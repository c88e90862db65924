//! Logkeeper - rotates aging log files into a size-bounded zip archive.
//!
//! Given a file-selection pattern and an age threshold, a run finds the log
//! files last modified at or before `now - threshold`, appends each one to a
//! zip archive stored next to it, and removes the original. When a capacity
//! is configured the oldest archived entries are evicted first so that the
//! archive never holds more than that many files.
//!
//! # Example
//!
//! ```rust,no_run
//! use logkeeper::{AgeThreshold, ArchiveCapacity, KeeperConfig, LogKeeper};
//!
//! let config = KeeperConfig::new("/var/log/myapp/*.log", "1 month".parse()?)?
//!     .with_max_archive_entries(ArchiveCapacity::try_from(30)?);
//!
//! LogKeeper::new(config).run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod config;
pub mod discovery;
pub mod error;
pub mod keeper;
pub mod selector;

// Re-export main types at crate root
pub use archive::{ArchiveEntry, ArchiveHandle, OpenFailure, read_entries};
pub use config::{
    AgeThreshold, ArchiveCapacity, ArchiveErrorPolicy, DEFAULT_ARCHIVE_NAME, KeeperConfig,
};
pub use discovery::{CandidateStream, FileStat, selection_glob};
pub use error::{ConfigError, KeeperError, Result};
pub use keeper::LogKeeper;
pub use selector::{EligibilitySelector, is_eligible};
