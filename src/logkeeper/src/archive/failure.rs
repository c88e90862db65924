//! Categories of archive open failures and their messages.

use std::fmt;
use std::io;

use zip::result::ZipError;

/// Why an archive could not be opened or created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    AlreadyExists,
    InvalidArgument,
    OutOfMemory,
    NoSuchFile,
    NotAnArchive,
    Read,
    Seek,
    Open,
    Unknown,
}

const MESSAGES: &[(OpenFailure, &str)] = &[
    (OpenFailure::AlreadyExists, "File already exists."),
    (OpenFailure::InvalidArgument, "Invalid argument."),
    (OpenFailure::OutOfMemory, "Malloc failure."),
    (OpenFailure::NoSuchFile, "No such file."),
    (OpenFailure::NotAnArchive, "Not a zip archive."),
    (OpenFailure::Read, "Read error."),
    (OpenFailure::Seek, "Seek error."),
    (OpenFailure::Open, "Can't open file."),
];

const UNKNOWN_MESSAGE: &str = "Unknown error.";

/// I/O error kinds raised while opening the archive file itself.
const OPEN_KINDS: &[(io::ErrorKind, OpenFailure)] = &[
    (io::ErrorKind::AlreadyExists, OpenFailure::AlreadyExists),
    (io::ErrorKind::InvalidInput, OpenFailure::InvalidArgument),
    (io::ErrorKind::OutOfMemory, OpenFailure::OutOfMemory),
    (io::ErrorKind::NotFound, OpenFailure::NoSuchFile),
];

impl OpenFailure {
    pub fn message(self) -> &'static str {
        MESSAGES
            .iter()
            .find(|(failure, _)| *failure == self)
            .map(|(_, message)| *message)
            .unwrap_or(UNKNOWN_MESSAGE)
    }

    /// Classify an error from opening the archive file.
    pub(crate) fn from_open_error(err: &io::Error) -> Self {
        lookup_kind(err.kind()).unwrap_or(OpenFailure::Open)
    }

    /// Classify an error from reading the archive's central directory.
    pub(crate) fn from_zip_error(err: &ZipError) -> Self {
        match err {
            ZipError::Io(e) if e.kind() == io::ErrorKind::OutOfMemory => OpenFailure::OutOfMemory,
            ZipError::Io(_) => OpenFailure::Read,
            ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => OpenFailure::NotAnArchive,
            ZipError::FileNotFound => OpenFailure::NoSuchFile,
            _ => OpenFailure::Unknown,
        }
    }
}

fn lookup_kind(kind: io::ErrorKind) -> Option<OpenFailure> {
    OPEN_KINDS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, failure)| *failure)
}

impl fmt::Display for OpenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Unwrap the I/O error inside a zip error, or wrap the zip error.
pub(crate) fn zip_to_io(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(e) => e,
        other => io::Error::other(other),
    }
}
