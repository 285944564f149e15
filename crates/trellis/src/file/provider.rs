//! The file capability interface that [`FileAccess`](super::FileAccess)
//! forwards to.
//!
//! A provider supplies synchronous and callback-based asynchronous reads and
//! writes plus change monitoring. [`LocalFileProvider`](super::LocalFileProvider)
//! implements it over the real file system; tests implement it in memory.

use std::path::Path;
use std::sync::Arc;

use trellis_core::CompletionDropped;

/// What changed about a monitored path.
///
/// Which variants are emitted, and when, is up to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorEvent {
    /// The file contents changed.
    Changed,
    /// A batch of changes finished (for example, a writer closed the file).
    ChangesDoneHint,
    /// The file was deleted.
    Deleted,
    /// The file was created.
    Created,
    /// Metadata (permissions, timestamps, ownership) changed.
    AttributeChanged,
    /// The file system holding the file is about to be unmounted.
    PreUnmount,
    /// The file system holding the file was unmounted.
    Unmounted,
    /// The file was moved, with no further detail available.
    Moved,
    /// The file was renamed within the monitored location.
    Renamed,
    /// A file was moved into the monitored location.
    MovedIn,
    /// A file was moved out of the monitored location.
    MovedOut,
}

impl std::fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MonitorEvent::Changed => "changed",
            MonitorEvent::ChangesDoneHint => "changes-done-hint",
            MonitorEvent::Deleted => "deleted",
            MonitorEvent::Created => "created",
            MonitorEvent::AttributeChanged => "attribute-changed",
            MonitorEvent::PreUnmount => "pre-unmount",
            MonitorEvent::Unmounted => "unmounted",
            MonitorEvent::Moved => "moved",
            MonitorEvent::Renamed => "renamed",
            MonitorEvent::MovedIn => "moved-in",
            MonitorEvent::MovedOut => "moved-out",
        };
        f.write_str(name)
    }
}

/// Completion callback for an asynchronous read.
///
/// `Ok(None)` means the provider produced no content.
pub type ReadCallback<E> = Box<dyn FnOnce(Result<Option<String>, E>) + Send + 'static>;

/// Completion callback for an asynchronous write.
pub type WriteCallback<E> = Box<dyn FnOnce(Result<(), E>) + Send + 'static>;

/// Change callback registered with [`FileProvider::monitor_file`].
///
/// Receives the path that changed and the kind of change.
pub type MonitorCallback = Arc<dyn Fn(&Path, MonitorEvent) + Send + Sync + 'static>;

/// A file capability provider.
///
/// Asynchronous operations take a completion callback that the provider
/// must invoke exactly once. A provider that drops the callback instead
/// causes the waiting side to settle with `Self::Error::from(CompletionDropped)`.
pub trait FileProvider: Send + Sync {
    /// The provider's failure type. Forwarded to callers unchanged.
    type Error: std::error::Error + From<CompletionDropped> + Send + 'static;

    /// Handle representing an active watch.
    type Monitor;

    /// Read the whole file synchronously. `None` means no content.
    fn read_file(&self, path: &Path) -> Option<String>;

    /// Start an asynchronous read and report through `callback`.
    fn read_file_async(&self, path: &Path, callback: ReadCallback<Self::Error>);

    /// Replace the file's contents synchronously.
    fn write_file(&self, path: &Path, content: &str) -> Result<(), Self::Error>;

    /// Start an asynchronous write and report through `callback`.
    fn write_file_async(&self, path: &Path, content: String, callback: WriteCallback<Self::Error>);

    /// Start watching `path`, invoking `callback` for every change.
    fn monitor_file(&self, path: &Path, callback: MonitorCallback) -> Result<Self::Monitor, Self::Error>;
}
