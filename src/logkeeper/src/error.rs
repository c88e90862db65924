//! Error types for logkeeper.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::archive::OpenFailure;

/// Errors raised while building a [`KeeperConfig`](crate::KeeperConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Max archive entries must not be less than -1, got {0}")]
    InvalidCapacity(i64),

    #[error("Invalid age threshold '{input}': {reason}")]
    InvalidAgeThreshold { input: String, reason: String },

    #[error("Selection pattern must not be empty")]
    EmptyPattern,

    #[error("Archive name must not be empty")]
    EmptyArchiveName,
}

/// Errors that terminate a keeping run.
#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid selection pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Could not open zip archive '{}': {failure}", path.display())]
    ArchiveOpen {
        path: PathBuf,
        failure: OpenFailure,
        #[source]
        source: io::Error,
    },

    #[error("Could not prepare archive directory '{}': {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not write zip archive '{}': {source}", path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Log file '{}' is no longer readable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not remove log file '{}': {source}", path.display())]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl KeeperError {
    /// Whether the error blocked access to an archive (open or directory setup).
    pub fn is_archive_access(&self) -> bool {
        matches!(
            self,
            KeeperError::ArchiveOpen { .. } | KeeperError::FileSystem { .. }
        )
    }
}

/// Result type for keeping operations.
pub type Result<T> = std::result::Result<T, KeeperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_open_message_names_path_and_cause() {
        let err = KeeperError::ArchiveOpen {
            path: PathBuf::from("/var/log/app/old.zip"),
            failure: OpenFailure::NotAnArchive,
            source: io::Error::from(io::ErrorKind::InvalidData),
        };
        assert_eq!(
            err.to_string(),
            "Could not open zip archive '/var/log/app/old.zip': Not a zip archive."
        );
        assert!(err.is_archive_access());
    }

    #[test]
    fn test_source_errors_are_not_archive_access() {
        let err = KeeperError::SourceUnavailable {
            path: PathBuf::from("a.log"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!err.is_archive_access());
    }

    #[test]
    fn test_config_error_converts() {
        let err: KeeperError = ConfigError::InvalidCapacity(-2).into();
        assert!(err.to_string().contains("-2"));
    }
}
