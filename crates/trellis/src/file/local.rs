//! The local file system provider.
//!
//! [`LocalFileProvider`] implements [`FileProvider`] with `std::fs` for the
//! synchronous operations, `tokio::fs` on an [`AsyncRuntime`] for the
//! asynchronous ones, and [`FileMonitor`] for change notification.
//!
//! Both read paths load raw bytes and decode them the same way, replacing
//! invalid UTF-8 sequences with `U+FFFD`.

use std::path::Path;
use std::sync::Arc;

use trellis_core::async_runtime::AsyncRuntime;
use trellis_core::logging::targets;

use super::error::{FileError, FileResult};
use super::monitor::{FileMonitor, MonitorOptions};
use super::provider::{FileProvider, MonitorCallback, ReadCallback, WriteCallback};

/// Configuration for [`LocalFileProvider`].
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// Create missing parent directories before writing.
    /// Default: true
    pub create_parent_dirs: bool,
    /// Options applied to every monitor the provider starts.
    pub monitor: MonitorOptions,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            create_parent_dirs: true,
            monitor: MonitorOptions::default(),
        }
    }
}

impl ProviderOptions {
    /// Create provider options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether missing parent directories are created on write.
    pub fn create_parent_dirs(mut self, create: bool) -> Self {
        self.create_parent_dirs = create;
        self
    }

    /// Set the monitor options.
    pub fn monitor(mut self, options: MonitorOptions) -> Self {
        self.monitor = options;
        self
    }
}

/// File provider backed by the local file system.
#[derive(Debug, Clone)]
pub struct LocalFileProvider {
    runtime: Arc<AsyncRuntime>,
    options: ProviderOptions,
}

impl Default for LocalFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFileProvider {
    /// Create a provider that runs asynchronous work on the global runtime.
    pub fn new() -> Self {
        Self::with_options(ProviderOptions::default())
    }

    /// Create a provider with custom options on the global runtime.
    pub fn with_options(options: ProviderOptions) -> Self {
        Self {
            runtime: AsyncRuntime::global(),
            options,
        }
    }

    /// Create a provider that runs asynchronous work on `runtime`.
    pub fn with_runtime(runtime: Arc<AsyncRuntime>, options: ProviderOptions) -> Self {
        Self { runtime, options }
    }

    /// The runtime asynchronous operations run on.
    pub fn runtime(&self) -> &Arc<AsyncRuntime> {
        &self.runtime
    }

    /// The provider's options.
    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    fn prepare_parent(&self, path: &Path) -> FileResult<()> {
        if !self.options.create_parent_dirs {
            return Ok(());
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
                std::fs::create_dir_all(parent).map_err(|e| FileError::from_io(e, parent))
            }
            _ => Ok(()),
        }
    }
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

async fn read_async(path: &Path) -> FileResult<Option<String>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FileError::from_io(e, path))?;
    Ok(Some(decode(bytes)))
}

async fn write_async(path: &Path, content: String, create_parent_dirs: bool) -> FileResult<()> {
    if create_parent_dirs {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FileError::from_io(e, parent))?;
        }
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| FileError::from_io(e, path))
}

impl FileProvider for LocalFileProvider {
    type Error = FileError;
    type Monitor = FileMonitor;

    fn read_file(&self, path: &Path) -> Option<String> {
        match std::fs::read(path) {
            Ok(bytes) => Some(decode(bytes)),
            Err(e) => {
                let err = FileError::from_io(e, path);
                tracing::error!(target: targets::FILE, "Failed to read file: {}", err);
                None
            }
        }
    }

    fn read_file_async(&self, path: &Path, callback: ReadCallback<FileError>) {
        let path = path.to_path_buf();
        self.runtime
            .spawn_with_callback(async move { read_async(&path).await }, callback);
    }

    fn write_file(&self, path: &Path, content: &str) -> FileResult<()> {
        self.prepare_parent(path)?;
        std::fs::write(path, content).map_err(|e| FileError::from_io(e, path))
    }

    fn write_file_async(&self, path: &Path, content: String, callback: WriteCallback<FileError>) {
        let path = path.to_path_buf();
        let create_parent_dirs = self.options.create_parent_dirs;
        self.runtime.spawn_with_callback(
            async move { write_async(&path, content, create_parent_dirs).await },
            callback,
        );
    }

    fn monitor_file(&self, path: &Path, callback: MonitorCallback) -> FileResult<FileMonitor> {
        FileMonitor::start_with(path, &self.options.monitor, move |(changed, event)| {
            callback(changed.as_path(), *event)
        })
        .map_err(|e| FileError::from(e).with_path(path))
    }
}
