//! Archive manager.
//!
//! Owns one zip archive per log directory for the duration of an
//! open/modify/close window:
//! - open or create the archive, preparing its directory
//! - enumerate entries with their stored modification time
//! - evict the oldest entries to respect a capacity
//! - add log files and persist everything atomically on close

mod directory;
mod failure;
mod handle;
mod timestamp;

pub use directory::{ARCHIVE_DIR_MODE, prepare_archive_dir};
pub use failure::OpenFailure;
pub use handle::{ArchiveEntry, ArchiveHandle, read_entries};
