//! Archive directory preparation.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{KeeperError, Result};

/// Mode used when creating or repairing an archive directory.
pub const ARCHIVE_DIR_MODE: u32 = 0o755;

/// Make sure `dir` exists and is readable, writable and searchable by its
/// owner, creating it recursively or resetting its mode when needed.
pub fn prepare_archive_dir(dir: &Path) -> Result<()> {
    let fs_error = |source| KeeperError::FileSystem {
        path: dir.to_path_buf(),
        source,
    };

    if !dir.is_dir() {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(ARCHIVE_DIR_MODE);
        }
        builder.create(dir).map_err(fs_error)?;
        debug!(path = %dir.display(), "Created archive directory");
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mode = fs::metadata(dir).map_err(fs_error)?.permissions().mode();
        if mode & 0o700 != 0o700 {
            fs::set_permissions(dir, fs::Permissions::from_mode(ARCHIVE_DIR_MODE)).map_err(fs_error)?;
            debug!(path = %dir.display(), mode = format!("{:o}", mode & 0o777), "Repaired archive directory permissions");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_nested_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("archive").join("2024");
        prepare_archive_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_repairs_owner_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("locked");
        fs::create_dir(&dir).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o500)).unwrap();

        prepare_archive_dir(&dir).unwrap();
        let mode = fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, ARCHIVE_DIR_MODE);
    }

    #[test]
    fn test_file_in_the_way_is_a_filesystem_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = prepare_archive_dir(&blocker.join("sub")).unwrap_err();
        assert!(matches!(err, KeeperError::FileSystem { .. }));
    }
}
