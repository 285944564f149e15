//! The file access adapter.
//!
//! [`FileAccess`] exposes five operations and forwards each one to a
//! [`FileProvider`]. It adds nothing of its own beyond two rules:
//!
//! - reads that produce no content yield an empty string, so an empty file
//!   and a failed synchronous read look the same to the caller;
//! - asynchronous operations hand the provider a completion callback and
//!   return a [`Completion`] future that settles exactly once.
//!
//! The free functions at the bottom of this module use a process-wide
//! adapter over [`LocalFileProvider`].

use std::path::Path;
use std::sync::{Arc, OnceLock};

use trellis_core::logging::targets;
use trellis_core::{Completion, completion_channel};

use super::error::{FileError, FileResult};
use super::local::LocalFileProvider;
use super::monitor::FileMonitor;
use super::provider::{FileProvider, MonitorEvent};

/// Forwards file operations to a [`FileProvider`].
#[derive(Debug, Clone, Default)]
pub struct FileAccess<P> {
    provider: P,
}

impl<P: FileProvider> FileAccess<P> {
    /// Create an adapter over `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The provider this adapter forwards to.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Consume the adapter and return its provider.
    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Read the whole file.
    ///
    /// Returns an empty string when the provider yields no content,
    /// including when the read failed.
    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        tracing::trace!(target: targets::FILE, path = %path.display(), "read_file");
        self.provider.read_file(path).unwrap_or_default()
    }

    /// Read the whole file without blocking.
    ///
    /// The read is issued immediately; the returned future only waits for
    /// its outcome. Resolves to an empty string when the provider yields no
    /// content, and to the provider's error, unchanged, on failure.
    pub fn read_file_async(&self, path: impl AsRef<Path>) -> Completion<String, P::Error> {
        let path = path.as_ref();
        tracing::trace!(target: targets::FILE, path = %path.display(), "read_file_async");
        let (completer, completion) = completion_channel();
        self.provider.read_file_async(
            path,
            Box::new(move |result| completer.complete(result.map(Option::unwrap_or_default))),
        );
        completion
    }

    /// Replace the file's contents.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub fn write_file(&self, path: impl AsRef<Path>, content: impl AsRef<str>) -> Result<(), P::Error> {
        let path = path.as_ref();
        tracing::trace!(target: targets::FILE, path = %path.display(), "write_file");
        self.provider.write_file(path, content.as_ref())
    }

    /// Replace the file's contents without blocking.
    ///
    /// The write is issued immediately; the returned future only waits for
    /// its outcome.
    pub fn write_file_async(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<String>,
    ) -> Completion<(), P::Error> {
        let path = path.as_ref();
        tracing::trace!(target: targets::FILE, path = %path.display(), "write_file_async");
        let (completer, completion) = completion_channel();
        self.provider.write_file_async(
            path,
            content.into(),
            Box::new(move |result| completer.complete(result)),
        );
        completion
    }

    /// Watch `path` and call `on_event` for every change the provider reports.
    ///
    /// Events are passed through as-is. The returned handle belongs to the
    /// provider; see its documentation for how to stop watching.
    pub fn monitor_file<F>(&self, path: impl AsRef<Path>, on_event: F) -> Result<P::Monitor, P::Error>
    where
        F: Fn(&Path, MonitorEvent) + Send + Sync + 'static,
    {
        let path = path.as_ref();
        tracing::trace!(target: targets::FILE, path = %path.display(), "monitor_file");
        self.provider.monitor_file(path, Arc::new(on_event))
    }
}

impl FileAccess<LocalFileProvider> {
    /// Create an adapter over a default [`LocalFileProvider`].
    pub fn local() -> Self {
        Self::new(LocalFileProvider::new())
    }
}

static DEFAULT_ACCESS: OnceLock<FileAccess<LocalFileProvider>> = OnceLock::new();

/// The process-wide adapter used by the free functions in this module.
pub fn default_access() -> &'static FileAccess<LocalFileProvider> {
    DEFAULT_ACCESS.get_or_init(FileAccess::local)
}

/// Read a file from the local file system. See [`FileAccess::read_file`].
pub fn read_file(path: impl AsRef<Path>) -> String {
    default_access().read_file(path)
}

/// Read a file without blocking. See [`FileAccess::read_file_async`].
pub fn read_file_async(path: impl AsRef<Path>) -> Completion<String, FileError> {
    default_access().read_file_async(path)
}

/// Write a file on the local file system. See [`FileAccess::write_file`].
pub fn write_file(path: impl AsRef<Path>, content: impl AsRef<str>) -> FileResult<()> {
    default_access().write_file(path, content)
}

/// Write a file without blocking. See [`FileAccess::write_file_async`].
pub fn write_file_async(path: impl AsRef<Path>, content: impl Into<String>) -> Completion<(), FileError> {
    default_access().write_file_async(path, content)
}

/// Watch a path on the local file system. See [`FileAccess::monitor_file`].
pub fn monitor_file<F>(path: impl AsRef<Path>, on_event: F) -> FileResult<FileMonitor>
where
    F: Fn(&Path, MonitorEvent) + Send + Sync + 'static,
{
    default_access().monitor_file(path, on_event)
}
