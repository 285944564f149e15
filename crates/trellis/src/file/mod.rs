//! File access: whole-file reads and writes plus change monitoring.
//!
//! [`FileAccess`] is a thin adapter over a [`FileProvider`]. It exposes
//! synchronous and asynchronous reads and writes and a way to watch a path
//! for changes, and forwards every call to the provider it was built with.
//! [`LocalFileProvider`] is the provider for the local file system.
//!
//! # Reading and Writing
//!
//! ```ignore
//! use trellis::file::{read_file, write_file};
//!
//! write_file("notes.txt", "first draft")?;
//! assert_eq!(read_file("notes.txt"), "first draft");
//!
//! // Missing or unreadable files read as an empty string
//! assert_eq!(read_file("does-not-exist.txt"), "");
//! ```
//!
//! # Asynchronous Access
//!
//! ```ignore
//! use trellis::file::{read_file_async, write_file_async};
//!
//! write_file_async("notes.txt", "second draft").await?;
//! let text = read_file_async("notes.txt").await?;
//! ```
//!
//! # Custom Providers
//!
//! ```ignore
//! use trellis::file::{FileAccess, LocalFileProvider, ProviderOptions};
//!
//! let access = FileAccess::new(LocalFileProvider::with_options(
//!     ProviderOptions::new().create_parent_dirs(false),
//! ));
//! let text = access.read_file("settings.toml");
//! ```
//!
//! # Monitoring
//!
//! ```ignore
//! use trellis::file::monitor_file;
//!
//! let monitor = monitor_file("settings.toml", |path, event| {
//!     println!("{event}: {}", path.display());
//! })?;
//!
//! // Stop watching
//! monitor.cancel();
//! ```

mod access;
mod error;
mod local;
mod monitor;
mod provider;

pub use access::{
    FileAccess, default_access, monitor_file, read_file, read_file_async, write_file,
    write_file_async,
};
pub use error::{FileError, FileErrorKind, FileResult};
pub use local::{LocalFileProvider, ProviderOptions};
pub use monitor::{FileMonitor, MonitorChange, MonitorError, MonitorOptions};
pub use provider::{FileProvider, MonitorCallback, MonitorEvent, ReadCallback, WriteCallback};
