//! File system monitoring for the local provider.
//!
//! A [`FileMonitor`] wraps a native watcher (inotify on Linux, FSEvents on
//! macOS, ReadDirectoryChangesW on Windows) and re-emits every change through
//! its [`changed`](FileMonitor::changed) signal.
//!
//! # What gets watched
//!
//! - A directory is watched directly, recursively by default.
//! - A file, or a path that does not exist yet, is watched through its parent
//!   directory and only events for the path itself are forwarded. This keeps
//!   the watch alive across delete/recreate cycles and reports the creation
//!   of a file that did not exist when monitoring started.
//!
//! # Example
//!
//! ```ignore
//! use trellis::file::{FileMonitor, MonitorOptions};
//!
//! let monitor = FileMonitor::start("config.toml", &MonitorOptions::default())?;
//! monitor.changed().connect(|(path, event)| {
//!     println!("{event}: {}", path.display());
//! });
//!
//! // Stop watching (also happens on drop)
//! monitor.cancel();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use trellis_core::Signal;
use trellis_core::logging::targets;

use super::error::{FileError, FileErrorKind};
use super::provider::MonitorEvent;

/// Configuration options for file monitoring.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Watch directories recursively.
    /// Default: true
    pub recursive: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self { recursive: true }
    }
}

impl MonitorOptions {
    /// Create new monitor options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether directories are watched recursively.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Errors raised while setting up a monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The native watcher could not be created.
    #[error("failed to start file monitor backend")]
    Backend(#[source] notify::Error),

    /// The native watcher refused the path.
    #[error("failed to watch '{}'", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Neither the path nor its parent directory exists.
    #[error("cannot monitor '{}': parent directory does not exist", .path.display())]
    MissingParent { path: PathBuf },
}

impl From<MonitorError> for FileError {
    fn from(err: MonitorError) -> Self {
        let (kind, path) = match &err {
            MonitorError::Backend(source) => (notify_error_kind(source), None),
            MonitorError::Watch { path, source } => (notify_error_kind(source), Some(path.clone())),
            MonitorError::MissingParent { path } => (FileErrorKind::NotFound, Some(path.clone())),
        };
        FileError::new(kind, path, std::io::Error::other(err))
    }
}

fn notify_error_kind(err: &notify::Error) -> FileErrorKind {
    match &err.kind {
        notify::ErrorKind::Io(io) => FileErrorKind::from_io_kind(io.kind()),
        notify::ErrorKind::PathNotFound => FileErrorKind::NotFound,
        _ => FileErrorKind::Monitor,
    }
}

/// Arguments carried by [`FileMonitor::changed`].
pub type MonitorChange = (PathBuf, MonitorEvent);

/// An active watch on a single path.
///
/// Dropping the monitor stops watching.
pub struct FileMonitor {
    /// The path monitoring was requested for.
    path: PathBuf,
    /// The path the native watcher is registered on.
    watched: PathBuf,
    /// The native watcher; `None` once cancelled.
    watcher: Mutex<Option<RecommendedWatcher>>,
    /// Signal emitted for every change.
    changed: Arc<Signal<MonitorChange>>,
    cancelled: AtomicBool,
}

impl FileMonitor {
    /// Start monitoring `path`.
    ///
    /// Slots connected to [`changed`](Self::changed) afterwards miss any
    /// event delivered before they were connected. Use
    /// [`start_with`](Self::start_with) to receive every event.
    pub fn start(path: impl AsRef<Path>, options: &MonitorOptions) -> Result<Self, MonitorError> {
        Self::watch(path.as_ref(), options, Signal::new())
    }

    /// Start monitoring `path` with `slot` connected before the native watch
    /// is registered.
    pub fn start_with<F>(
        path: impl AsRef<Path>,
        options: &MonitorOptions,
        slot: F,
    ) -> Result<Self, MonitorError>
    where
        F: Fn(&MonitorChange) + Send + Sync + 'static,
    {
        let changed = Signal::new();
        changed.connect(slot);
        Self::watch(path.as_ref(), options, changed)
    }

    fn watch(
        path: &Path,
        options: &MonitorOptions,
        changed: Signal<MonitorChange>,
    ) -> Result<Self, MonitorError> {
        let target = WatchTarget::resolve(path, options)?;
        let changed = Arc::new(changed);

        let handler_signal = Arc::clone(&changed);
        let filter = target.filter.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for change in translate(&event, filter.as_deref()) {
                        handler_signal.emit(change);
                    }
                }
                Err(e) => {
                    tracing::warn!(target: targets::MONITOR, "File monitor error: {}", e);
                }
            }
        })
        .map_err(MonitorError::Backend)?;

        watcher
            .watch(&target.watched, target.mode)
            .map_err(|source| MonitorError::Watch {
                path: target.watched.clone(),
                source,
            })?;

        tracing::debug!(
            target: targets::MONITOR,
            path = %path.display(),
            watched = %target.watched.display(),
            recursive = matches!(target.mode, RecursiveMode::Recursive),
            "monitor started"
        );

        Ok(Self {
            path: path.to_path_buf(),
            watched: target.watched,
            watcher: Mutex::new(Some(watcher)),
            changed,
            cancelled: AtomicBool::new(false),
        })
    }

    /// The path monitoring was requested for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path the native watcher is registered on.
    ///
    /// This is the parent directory when monitoring a file.
    pub fn watched_path(&self) -> &Path {
        &self.watched
    }

    /// Signal emitted with `(path, event)` for every change.
    pub fn changed(&self) -> &Signal<MonitorChange> {
        &self.changed
    }

    /// Stop monitoring.
    ///
    /// Returns `true` if the monitor was active. Emissions that start after
    /// this call are suppressed; an event already being delivered on the
    /// backend thread may still reach its slots once.
    ///
    /// Safe to call from inside a slot, which runs on the backend thread.
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.changed.set_blocked(true);
        // unwatch() blocks on the backend thread, which may be the caller
        drop(self.watcher.lock().take());
        tracing::debug!(target: targets::MONITOR, path = %self.path.display(), "monitor cancelled");
        true
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for FileMonitor {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for FileMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMonitor")
            .field("path", &self.path)
            .field("watched", &self.watched)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Where the native watcher goes and which events pass through.
#[derive(Debug)]
struct WatchTarget {
    watched: PathBuf,
    mode: RecursiveMode,
    /// When set, only events for this exact path are forwarded.
    filter: Option<PathBuf>,
}

impl WatchTarget {
    fn resolve(path: &Path, options: &MonitorOptions) -> Result<Self, MonitorError> {
        if path.is_dir() {
            let watched = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            let mode = if options.recursive {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            return Ok(Self {
                watched,
                mode,
                filter: None,
            });
        }

        let missing_parent = || MonitorError::MissingParent {
            path: path.to_path_buf(),
        };
        let file_name = path.file_name().ok_or_else(missing_parent)?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let parent = parent.canonicalize().map_err(|_| missing_parent())?;
        if !parent.is_dir() {
            return Err(missing_parent());
        }

        Ok(Self {
            filter: Some(parent.join(file_name)),
            watched: parent,
            mode: RecursiveMode::NonRecursive,
        })
    }
}

/// Map a native event kind onto a [`MonitorEvent`].
///
/// Returns `None` for kinds with no counterpart (plain access, backend
/// specific "other" events).
fn event_kind(kind: &EventKind) -> Option<MonitorEvent> {
    match kind {
        EventKind::Create(_) => Some(MonitorEvent::Created),
        EventKind::Remove(_) => Some(MonitorEvent::Deleted),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(MonitorEvent::AttributeChanged),
        EventKind::Modify(ModifyKind::Name(mode)) => Some(match mode {
            RenameMode::From => MonitorEvent::MovedOut,
            RenameMode::To => MonitorEvent::MovedIn,
            RenameMode::Both => MonitorEvent::Renamed,
            _ => MonitorEvent::Moved,
        }),
        EventKind::Modify(_) | EventKind::Any => Some(MonitorEvent::Changed),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            Some(MonitorEvent::ChangesDoneHint)
        }
        EventKind::Access(_) | EventKind::Other => None,
    }
}

/// Turn one native event into the changes to emit.
///
/// Every path of the event is reported; renames therefore report both the
/// old and the new name.
fn translate(event: &Event, filter: Option<&Path>) -> Vec<MonitorChange> {
    let Some(kind) = event_kind(&event.kind) else {
        return Vec::new();
    };
    event
        .paths
        .iter()
        .filter(|path| filter.is_none_or(|target| path.as_path() == target))
        .map(|path| (path.clone(), kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::fs;
    use std::time::Duration;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("Failed to create temp directory")
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(
            event_kind(&EventKind::Create(CreateKind::File)),
            Some(MonitorEvent::Created)
        );
        assert_eq!(
            event_kind(&EventKind::Remove(RemoveKind::Any)),
            Some(MonitorEvent::Deleted)
        );
        assert_eq!(
            event_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(MonitorEvent::Changed)
        );
        assert_eq!(
            event_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
            Some(MonitorEvent::AttributeChanged)
        );
        assert_eq!(
            event_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(MonitorEvent::MovedOut)
        );
        assert_eq!(
            event_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(MonitorEvent::MovedIn)
        );
        assert_eq!(
            event_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            Some(MonitorEvent::Renamed)
        );
        assert_eq!(
            event_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::Any))),
            Some(MonitorEvent::Moved)
        );
        assert_eq!(
            event_kind(&EventKind::Access(AccessKind::Close(AccessMode::Write))),
            Some(MonitorEvent::ChangesDoneHint)
        );
        assert_eq!(event_kind(&EventKind::Access(AccessKind::Any)), None);
        assert_eq!(event_kind(&EventKind::Other), None);
    }

    #[test]
    fn test_translate_filters_to_target() {
        let ev = event(
            EventKind::Create(CreateKind::File),
            &["/watched/a.txt", "/watched/b.txt"],
        );
        let changes = translate(&ev, Some(Path::new("/watched/b.txt")));
        assert_eq!(
            changes,
            vec![(PathBuf::from("/watched/b.txt"), MonitorEvent::Created)]
        );
    }

    #[test]
    fn test_translate_without_filter_reports_every_path() {
        let ev = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/dir/old", "/dir/new"],
        );
        let changes = translate(&ev, None);
        assert_eq!(
            changes,
            vec![
                (PathBuf::from("/dir/old"), MonitorEvent::Renamed),
                (PathBuf::from("/dir/new"), MonitorEvent::Renamed),
            ]
        );
    }

    #[test]
    fn test_translate_drops_unmapped_kinds() {
        let ev = event(EventKind::Access(AccessKind::Any), &["/dir/file"]);
        assert!(translate(&ev, None).is_empty());
    }

    #[test]
    fn test_monitor_directory() {
        let dir = temp_dir();
        let monitor = FileMonitor::start(dir.path(), &MonitorOptions::default()).unwrap();
        assert_eq!(monitor.watched_path(), dir.path().canonicalize().unwrap());
        assert_eq!(monitor.path(), dir.path());
        assert!(!monitor.is_cancelled());
    }

    #[test]
    fn test_monitor_file_watches_parent() {
        let dir = temp_dir();
        let file_path = dir.path().join("test.txt");
        fs::write(&file_path, "hello").unwrap();

        let monitor = FileMonitor::start(&file_path, &MonitorOptions::default()).unwrap();
        assert_eq!(monitor.watched_path(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_monitor_nonexistent_file_in_existing_dir() {
        let dir = temp_dir();
        let monitor = FileMonitor::start(dir.path().join("later.txt"), &MonitorOptions::default());
        assert!(monitor.is_ok());
    }

    #[test]
    fn test_monitor_missing_parent() {
        let dir = temp_dir();
        let path = dir.path().join("missing").join("file.txt");
        let err = FileMonitor::start(&path, &MonitorOptions::default()).unwrap_err();
        assert!(matches!(err, MonitorError::MissingParent { .. }));

        let file_err = FileError::from(err);
        assert!(file_err.is_not_found());
        assert_eq!(file_err.path(), Some(path.as_path()));
    }

    #[test]
    fn test_cancel() {
        let dir = temp_dir();
        let monitor = FileMonitor::start(dir.path(), &MonitorOptions::default()).unwrap();
        assert!(monitor.cancel());
        assert!(monitor.is_cancelled());
        assert!(monitor.changed().is_blocked());
        assert!(!monitor.cancel());
    }

    #[test]
    fn test_options_builder() {
        assert!(MonitorOptions::new().recursive);
        assert!(!MonitorOptions::new().recursive(false).recursive);
    }

    // Depends on OS notification delivery
    #[test]
    fn test_file_creation_detected() {
        let dir = temp_dir();
        let file_path = dir.path().join("created.txt");

        let monitor = FileMonitor::start(&file_path, &MonitorOptions::default()).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);
        monitor.changed().connect(move |change| {
            let _ = tx.lock().send(change.clone());
        });

        std::thread::sleep(Duration::from_millis(50));
        fs::write(&file_path, "new").unwrap();

        let expected = dir.path().canonicalize().unwrap().join("created.txt");
        let (path, event) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(path, expected);
        assert!(matches!(event, MonitorEvent::Created | MonitorEvent::Changed));
    }

    /// Collects every change delivered to a slot.
    fn recorder() -> (
        impl Fn(&MonitorChange) + Send + Sync + 'static,
        std::sync::mpsc::Receiver<MonitorChange>,
    ) {
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);
        (move |change: &MonitorChange| {
            let _ = tx.lock().send(change.clone());
        }, rx)
    }

    fn wait_for_name(
        rx: &std::sync::mpsc::Receiver<MonitorChange>,
        name: &str,
        timeout: Duration,
    ) -> Option<MonitorChange> {
        let deadline = std::time::Instant::now() + timeout;
        while let Some(remaining) = deadline.checked_duration_since(std::time::Instant::now()) {
            match rx.recv_timeout(remaining) {
                Ok(change) if change.0.file_name().is_some_and(|n| n == name) => return Some(change),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    }

    // Depends on OS notification delivery
    #[test]
    fn test_recursive_directory_reports_subtree() {
        let dir = temp_dir();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let (slot, rx) = recorder();
        let _monitor = FileMonitor::start_with(dir.path(), &MonitorOptions::default(), slot).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        fs::write(sub.join("deep.txt"), "nested").unwrap();
        let change = wait_for_name(&rx, "deep.txt", Duration::from_secs(5));
        let (path, _) = change.expect("no event from inside the subdirectory");
        assert!(path.starts_with(dir.path().canonicalize().unwrap().join("sub")));
    }

    // Depends on OS notification delivery
    #[test]
    fn test_non_recursive_directory_ignores_subtree() {
        let dir = temp_dir();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let (slot, rx) = recorder();
        let options = MonitorOptions::new().recursive(false);
        let _monitor = FileMonitor::start_with(dir.path(), &options, slot).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        fs::write(sub.join("deep.txt"), "nested").unwrap();
        fs::write(dir.path().join("top.txt"), "direct").unwrap();

        // The direct child is reported, the nested one is not
        assert!(wait_for_name(&rx, "top.txt", Duration::from_secs(5)).is_some());
        assert!(wait_for_name(&rx, "deep.txt", Duration::from_millis(500)).is_none());
    }

    // Depends on OS notification delivery
    #[test]
    fn test_drop_monitor_from_inside_slot() {
        let dir = temp_dir();
        let file_path = dir.path().join("once.txt");
        fs::write(&file_path, "v1").unwrap();

        let holder: Arc<Mutex<Option<FileMonitor>>> = Arc::new(Mutex::new(None));
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);

        let slot_holder = holder.clone();
        let monitor = FileMonitor::start_with(&file_path, &MonitorOptions::default(), move |_| {
            let taken = slot_holder.lock().take();
            let was_active = taken.as_ref().is_some_and(|m| !m.is_cancelled());
            drop(taken);
            let _ = tx.lock().send(was_active);
        })
        .unwrap();
        *holder.lock() = Some(monitor);
        std::thread::sleep(Duration::from_millis(50));

        fs::write(&file_path, "v2").unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));

        fs::write(&file_path, "v3").unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
        assert!(holder.lock().is_none());
    }
}
