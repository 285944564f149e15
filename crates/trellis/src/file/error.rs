//! Error type of the local file provider.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use trellis_core::CompletionDropped;

/// Why a local file operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorKind {
    NotFound,
    PermissionDenied,
    AlreadyExists,
    /// The path was malformed or named something that cannot exist.
    InvalidPath,
    /// A file was expected but the path is a directory.
    IsDirectory,
    /// A path component that must be a directory is not one.
    NotDirectory,
    ResourceBusy,
    NoSpace,
    ReadOnly,
    Interrupted,
    TooLarge,
    /// The asynchronous operation was dropped before it completed, for
    /// example because its runtime shut down.
    Abandoned,
    /// The change notification backend failed.
    Monitor,
    Other,
}

impl FileErrorKind {
    /// Classify a standard I/O error kind.
    pub fn from_io_kind(kind: io::ErrorKind) -> Self {
        use std::io::ErrorKind as Io;
        match kind {
            Io::NotFound => Self::NotFound,
            Io::PermissionDenied => Self::PermissionDenied,
            Io::AlreadyExists => Self::AlreadyExists,
            Io::InvalidInput | Io::InvalidFilename => Self::InvalidPath,
            Io::IsADirectory => Self::IsDirectory,
            Io::NotADirectory => Self::NotDirectory,
            Io::ResourceBusy => Self::ResourceBusy,
            Io::StorageFull => Self::NoSpace,
            Io::ReadOnlyFilesystem => Self::ReadOnly,
            Io::Interrupted => Self::Interrupted,
            Io::FileTooLarge => Self::TooLarge,
            _ => Self::Other,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::NotFound => "file not found",
            Self::PermissionDenied => "permission denied",
            Self::AlreadyExists => "file already exists",
            Self::InvalidPath => "invalid path",
            Self::IsDirectory => "is a directory",
            Self::NotDirectory => "not a directory",
            Self::ResourceBusy => "resource busy",
            Self::NoSpace => "no space left on device",
            Self::ReadOnly => "read-only filesystem",
            Self::Interrupted => "operation interrupted",
            Self::TooLarge => "file too large",
            Self::Abandoned => "operation abandoned",
            Self::Monitor => "file monitor error",
            Self::Other => "file error",
        }
    }
}

impl fmt::Display for FileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A failed local file operation: what went wrong, where, and the
/// underlying cause.
#[derive(Debug)]
pub struct FileError {
    kind: FileErrorKind,
    path: Option<PathBuf>,
    source: io::Error,
}

impl FileError {
    pub(crate) fn new(kind: FileErrorKind, path: Option<PathBuf>, source: io::Error) -> Self {
        Self { kind, path, source }
    }

    /// Wrap an I/O error raised while operating on `path`.
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::new(FileErrorKind::from_io_kind(err.kind()), Some(path.into()), err)
    }

    pub fn kind(&self) -> FileErrorKind {
        self.kind
    }

    /// The path the operation was working on, when known.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FileErrorKind::NotFound
    }

    /// Attach `path` unless the error already names one.
    pub(crate) fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path.get_or_insert_with(|| path.into());
        self
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.message())?;
        if let Some(path) = &self.path {
            write!(f, ": {}", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<CompletionDropped> for FileError {
    fn from(err: CompletionDropped) -> Self {
        Self::new(FileErrorKind::Abandoned, None, io::Error::other(err))
    }
}

/// Result of a local file operation.
pub type FileResult<T> = Result<T, FileError>;
