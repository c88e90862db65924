//! Open/modify/close cycle over one zip archive.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::FullFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::ArchiveCapacity;
use crate::error::{KeeperError, Result};

use super::directory::prepare_archive_dir;
use super::failure::{OpenFailure, zip_to_io};
use super::timestamp;

/// Permissions given to a newly created archive.
#[cfg(unix)]
const ARCHIVE_FILE_MODE: u32 = 0o644;

/// One file stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// Entry name (the base name of the archived file).
    pub name: String,
    /// Stored modification time; `None` when the archive holds no valid one.
    pub modified: Option<DateTime<Utc>>,
    /// Storage ordinal, increasing in insertion order.
    pub index: usize,
}

enum EntryData {
    Stored { raw_index: usize },
    Pending { file: File },
}

struct Slot {
    entry: ArchiveEntry,
    data: EntryData,
}

/// An archive opened for modification.
///
/// Evictions and additions are staged in memory and written by
/// [`close`](Self::close). Dropping the handle discards them.
pub struct ArchiveHandle {
    path: PathBuf,
    stored: Option<ZipArchive<File>>,
    slots: Vec<Slot>,
    next_index: usize,
    dirty: bool,
}

impl ArchiveHandle {
    /// Open the archive at `path`, or start a new one if it does not exist.
    ///
    /// The parent directory is created (mode 0755) or repaired first.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        prepare_archive_dir(&parent_dir(path))?;
        Self::load(path, true)
    }

    /// Open an existing archive without touching its directory.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path.as_ref(), false)
    }

    fn load(path: &Path, create: bool) -> Result<Self> {
        let open_error = |failure, source| KeeperError::ArchiveOpen {
            path: path.to_path_buf(),
            failure,
            source,
        };

        if path.is_dir() {
            return Err(open_error(
                OpenFailure::Open,
                io::Error::from(io::ErrorKind::IsADirectory),
            ));
        }

        let file = match File::open(path) {
            Ok(file) => Some(file),
            Err(e) if create && e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(open_error(OpenFailure::from_open_error(&e), e)),
        };

        let mut stored = None;
        if let Some(mut file) = file {
            let len = file
                .seek(SeekFrom::End(0))
                .and_then(|len| file.rewind().map(|()| len))
                .map_err(|e| open_error(OpenFailure::Seek, e))?;
            // An empty file is treated as a new archive.
            if len > 0 {
                let archive = ZipArchive::new(file).map_err(|e| {
                    open_error(OpenFailure::from_zip_error(&e), zip_to_io(e))
                })?;
                stored = Some(archive);
            }
        }

        let mut slots = Vec::new();
        if let Some(archive) = stored.as_mut() {
            for raw_index in 0..archive.len() {
                let file = archive
                    .by_index_raw(raw_index)
                    .map_err(|e| open_error(OpenFailure::from_zip_error(&e), zip_to_io(e)))?;
                slots.push(Slot {
                    entry: ArchiveEntry {
                        name: file.name().to_string(),
                        modified: timestamp::from_extra_fields(file.extra_data_fields())
                            .or_else(|| file.last_modified().and_then(timestamp::from_zip)),
                        index: raw_index,
                    },
                    data: EntryData::Stored { raw_index },
                });
            }
        }

        debug!(path = %path.display(), entries = slots.len(), "Opened archive");

        Ok(Self {
            path: path.to_path_buf(),
            stored,
            next_index: slots.len(),
            slots,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Live entries in storage order.
    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.slots.iter().map(|slot| &slot.entry)
    }

    /// Remove the entry with storage ordinal `index`.
    pub fn delete_index(&mut self, index: usize) -> Option<ArchiveEntry> {
        let position = self.slots.iter().position(|slot| slot.entry.index == index)?;
        self.dirty = true;
        Some(self.slots.remove(position).entry)
    }

    /// Evict oldest entries until there is room for one more.
    ///
    /// Entries are evicted by ascending modification time, ties broken by
    /// storage order, while the entry count is at least the capacity.
    /// Unbounded archives are left untouched. Returns the evicted entries.
    pub fn enforce_capacity(&mut self, capacity: ArchiveCapacity) -> Vec<ArchiveEntry> {
        let max = match capacity {
            ArchiveCapacity::Unbounded => return Vec::new(),
            ArchiveCapacity::Disabled => 0,
            ArchiveCapacity::Bounded(max) => max.get(),
        };

        let mut live = self.slots.len();
        if live < max {
            return Vec::new();
        }

        let mut order: Vec<(Option<DateTime<Utc>>, usize)> = self
            .entries()
            .map(|entry| (entry.modified, entry.index))
            .collect();
        order.sort();

        let mut evicted = Vec::new();
        let mut oldest_first = order.into_iter();
        while live >= max {
            let Some((_, index)) = oldest_first.next() else {
                break;
            };
            if let Some(entry) = self.delete_index(index) {
                debug!(archive = %self.path.display(), name = %entry.name, "Removed old file");
                evicted.push(entry);
            }
            live -= 1;
        }

        evicted
    }

    /// Stage `source` for addition under its base name. An entry with the
    /// same name is replaced in place and keeps its storage ordinal.
    ///
    /// The source is opened immediately; a file that vanished or cannot be
    /// read is reported as [`KeeperError::SourceUnavailable`], and so is a
    /// base name that is not valid UTF-8.
    pub fn add_entry(&mut self, source: impl AsRef<Path>) -> Result<&ArchiveEntry> {
        let source = source.as_ref();
        let unavailable = |e| KeeperError::SourceUnavailable {
            path: source.to_path_buf(),
            source: e,
        };

        let name = source
            .file_name()
            .ok_or_else(|| unavailable(io::Error::from(io::ErrorKind::InvalidInput)))?
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| {
                unavailable(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "file name is not valid UTF-8",
                ))
            })?;
        let file = File::open(source).map_err(unavailable)?;
        let modified = file
            .metadata()
            .and_then(|metadata| metadata.modified())
            .map_err(unavailable)?;

        let modified = timestamp::truncate(DateTime::<Utc>::from(modified));
        self.dirty = true;

        let position = match self.slots.iter().position(|slot| slot.entry.name == name) {
            Some(position) => {
                let slot = &mut self.slots[position];
                slot.entry.modified = modified;
                slot.data = EntryData::Pending { file };
                position
            }
            None => {
                self.slots.push(Slot {
                    entry: ArchiveEntry {
                        name,
                        modified,
                        index: self.next_index,
                    },
                    data: EntryData::Pending { file },
                });
                self.next_index += 1;
                self.slots.len() - 1
            }
        };

        Ok(&self.slots[position].entry)
    }

    /// Persist all staged changes.
    ///
    /// The new archive is written to a temporary file next to the target,
    /// synced and renamed over it, so readers see either the old or the new
    /// archive.
    pub fn close(self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let ArchiveHandle {
            path,
            mut stored,
            slots,
            ..
        } = self;
        let write_error = |source| KeeperError::ArchiveWrite {
            path: path.clone(),
            source,
        };

        let previous_permissions = fs::metadata(&path).ok().map(|m| m.permissions());
        let mut temp = NamedTempFile::new_in(parent_dir(&path)).map_err(write_error)?;

        {
            let mut writer = ZipWriter::new(temp.as_file_mut());
            for slot in slots {
                match slot.data {
                    EntryData::Stored { raw_index } => {
                        let archive = stored.as_mut().ok_or_else(|| {
                            write_error(io::Error::other("stored entry without source archive"))
                        })?;
                        let file = archive
                            .by_index_raw(raw_index)
                            .map_err(|e| write_error(zip_to_io(e)))?;
                        writer
                            .raw_copy_file(file)
                            .map_err(|e| write_error(zip_to_io(e)))?;
                    }
                    EntryData::Pending { mut file } => {
                        let mut options = FullFileOptions::default()
                            .compression_method(CompressionMethod::Deflated);
                        if let Some(modified) = slot.entry.modified {
                            options = options.last_modified_time(timestamp::to_zip(modified));
                            if let Some(field) = timestamp::extended_field(modified) {
                                options
                                    .add_extra_data(timestamp::EXTENDED_TIMESTAMP_ID, field, false)
                                    .map_err(|e| write_error(zip_to_io(e)))?;
                            }
                        }
                        #[cfg(unix)]
                        {
                            options = options.unix_permissions(ARCHIVE_FILE_MODE);
                        }
                        writer
                            .start_file(slot.entry.name.clone(), options)
                            .map_err(|e| write_error(zip_to_io(e)))?;
                        io::copy(&mut file, &mut writer).map_err(write_error)?;
                    }
                }
            }
            writer.finish().map_err(|e| write_error(zip_to_io(e)))?;
        }

        temp.as_file().sync_all().map_err(write_error)?;
        match previous_permissions {
            Some(permissions) => temp
                .as_file()
                .set_permissions(permissions)
                .map_err(write_error)?,
            #[cfg(unix)]
            None => {
                use std::os::unix::fs::PermissionsExt;
                temp.as_file()
                    .set_permissions(fs::Permissions::from_mode(ARCHIVE_FILE_MODE))
                    .map_err(write_error)?;
            }
            #[cfg(not(unix))]
            None => {}
        }

        // Release the old archive before replacing it.
        drop(stored);
        temp.persist(&path).map_err(|e| write_error(e.error))?;

        debug!(path = %path.display(), "Archive written");
        Ok(())
    }
}

/// List the entries of an existing archive in storage order.
pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<ArchiveEntry>> {
    let handle = ArchiveHandle::open_existing(path)?;
    Ok(handle.entries().cloned().collect())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
