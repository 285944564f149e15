//! Async runtime integration for Trellis.
//!
//! An [`AsyncRuntime`] owns a Tokio runtime and runs futures whose outcome is
//! handed to a completion callback. The local file provider runs every
//! asynchronous read and write this way.
//!
//! Requires the `tokio` feature.
//!
//! # Example
//!
//! ```no_run
//! use trellis_core::async_runtime::AsyncRuntime;
//!
//! let runtime = AsyncRuntime::global();
//!
//! // The callback runs on a runtime thread once the future finishes
//! runtime.spawn_with_callback(async { 6 * 7 }, |answer| {
//!     println!("answer: {answer}");
//! });
//! ```
//!
//! # Runtime Types
//!
//! - **Multi-threaded** (default): Tokio's multi-threaded scheduler. Callbacks
//!   may run on any worker.
//! - **Single-threaded**: a current-thread runtime driven by one dedicated
//!   thread. Callbacks all run on that thread, in the order their futures
//!   finish.
//!
//! # Shutdown
//!
//! After [`AsyncRuntime::shutdown`], newly spawned futures are dropped
//! without running, and so are their callbacks. Completion-based callers
//! observe this as an abandoned operation.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;

use crate::logging::targets;

static GLOBAL_RUNTIME: OnceLock<Arc<AsyncRuntime>> = OnceLock::new();

/// The type of async runtime to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeType {
    /// Multi-threaded runtime using Tokio's default scheduler.
    #[default]
    MultiThreaded,

    /// Single-threaded runtime on a dedicated thread.
    SingleThreaded,
}

/// Configuration for the async runtime.
#[derive(Debug, Clone)]
pub struct AsyncRuntimeConfig {
    /// The type of runtime to create.
    pub runtime_type: RuntimeType,
    /// Number of worker threads for a multi-threaded runtime.
    /// Default: one per CPU core
    pub worker_threads: Option<usize>,
    /// Name prefix for runtime threads.
    pub thread_name: String,
}

impl Default for AsyncRuntimeConfig {
    fn default() -> Self {
        Self {
            runtime_type: RuntimeType::MultiThreaded,
            worker_threads: None,
            thread_name: "trellis-async".to_string(),
        }
    }
}

impl AsyncRuntimeConfig {
    /// Configuration for a multi-threaded runtime.
    pub fn multi_threaded() -> Self {
        Self::default()
    }

    /// Configuration for a single-threaded runtime.
    pub fn single_threaded() -> Self {
        Self {
            runtime_type: RuntimeType::SingleThreaded,
            ..Self::default()
        }
    }

    /// Set the number of worker threads.
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = Some(count);
        self
    }

    /// Set the thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// What keeps the runtime's scheduler alive.
enum Driver {
    /// A multi-threaded runtime owned directly.
    Owned(Runtime),
    /// A current-thread runtime blocked on a shutdown signal in its own thread.
    Dedicated {
        shutdown_tx: oneshot::Sender<()>,
        thread: JoinHandle<()>,
    },
}

/// A Tokio runtime that runs futures and reports through callbacks.
///
/// Shared as `Arc<AsyncRuntime>` between the providers that use it.
pub struct AsyncRuntime {
    handle: Handle,
    runtime_type: RuntimeType,
    /// `None` once shut down.
    driver: Mutex<Option<Driver>>,
}

impl AsyncRuntime {
    /// The process-wide runtime, created with default settings on first use
    /// unless [`init_global`](Self::init_global) ran earlier.
    pub fn global() -> Arc<AsyncRuntime> {
        GLOBAL_RUNTIME
            .get_or_init(|| {
                Arc::new(
                    AsyncRuntime::new(AsyncRuntimeConfig::default())
                        .expect("Failed to create global async runtime"),
                )
            })
            .clone()
    }

    /// Create the process-wide runtime with a custom configuration.
    ///
    /// Fails with [`AsyncRuntimeError::AlreadyInitialized`] once the global
    /// runtime exists.
    pub fn init_global(config: AsyncRuntimeConfig) -> Result<Arc<AsyncRuntime>, AsyncRuntimeError> {
        if GLOBAL_RUNTIME.get().is_some() {
            return Err(AsyncRuntimeError::AlreadyInitialized);
        }
        let runtime = Arc::new(AsyncRuntime::new(config)?);
        GLOBAL_RUNTIME
            .set(runtime.clone())
            .map_err(|_| AsyncRuntimeError::AlreadyInitialized)?;
        Ok(runtime)
    }

    /// Create a runtime with the given configuration.
    pub fn new(config: AsyncRuntimeConfig) -> Result<Self, AsyncRuntimeError> {
        tracing::debug!(
            target: targets::RUNTIME,
            runtime_type = ?config.runtime_type,
            thread_name = %config.thread_name,
            "creating async runtime"
        );
        let (handle, driver) = match config.runtime_type {
            RuntimeType::MultiThreaded => {
                let mut builder = Builder::new_multi_thread();
                builder.thread_name(&config.thread_name).enable_all();
                if let Some(workers) = config.worker_threads {
                    builder.worker_threads(workers);
                }
                let runtime = builder
                    .build()
                    .map_err(|e| AsyncRuntimeError::CreationFailed(e.to_string()))?;
                (runtime.handle().clone(), Driver::Owned(runtime))
            }
            RuntimeType::SingleThreaded => Self::start_dedicated(&config.thread_name)?,
        };
        Ok(Self {
            handle,
            runtime_type: config.runtime_type,
            driver: Mutex::new(Some(driver)),
        })
    }

    fn start_dedicated(thread_name: &str) -> Result<(Handle, Driver), AsyncRuntimeError> {
        let (handle_tx, handle_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::Builder::new()
            .name(format!("{thread_name}-main"))
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = handle_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = handle_tx.send(Ok(runtime.handle().clone()));
                runtime.block_on(async {
                    let _ = shutdown_rx.await;
                });
            })
            .map_err(|e| AsyncRuntimeError::CreationFailed(e.to_string()))?;

        let handle = handle_rx
            .recv()
            .map_err(|_| AsyncRuntimeError::CreationFailed("runtime thread exited".to_string()))?
            .map_err(AsyncRuntimeError::CreationFailed)?;
        Ok((handle, Driver::Dedicated { shutdown_tx, thread }))
    }

    /// The runtime type.
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    /// A handle to the underlying Tokio runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns true once [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.driver.lock().is_none()
    }

    /// Run `future` and hand its output to `callback`.
    ///
    /// The callback runs at most once, on a runtime thread. If the runtime
    /// is shut down first, both are dropped without running.
    pub fn spawn_with_callback<F, T, C>(&self, future: F, callback: C)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        tracing::trace!(target: targets::RUNTIME, "spawning callback task");
        self.handle.spawn(async move {
            callback(future.await);
        });
    }

    /// Stop the runtime.
    ///
    /// Running tasks are abandoned without waiting for them. Returns `true`
    /// if the runtime was still running.
    pub fn shutdown(&self) -> bool {
        let Some(driver) = self.driver.lock().take() else {
            return false;
        };
        tracing::debug!(target: targets::RUNTIME, runtime_type = ?self.runtime_type, "shutting down async runtime");
        match driver {
            Driver::Owned(runtime) => runtime.shutdown_background(),
            Driver::Dedicated { shutdown_tx, thread } => {
                let _ = shutdown_tx.send(());
                // Joining from the runtime thread itself would never return
                if thread.thread().id() != std::thread::current().id() {
                    let _ = thread.join();
                }
            }
        }
        true
    }
}

impl Drop for AsyncRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AsyncRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncRuntime")
            .field("runtime_type", &self.runtime_type)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Errors that can occur with the async runtime.
#[derive(Debug, Clone)]
pub enum AsyncRuntimeError {
    /// The global runtime has already been initialized.
    AlreadyInitialized,
    /// Failed to create the runtime.
    CreationFailed(String),
}

impl std::fmt::Display for AsyncRuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "Async runtime already initialized"),
            Self::CreationFailed(msg) => write!(f, "Failed to create async runtime: {}", msg),
        }
    }
}

impl std::error::Error for AsyncRuntimeError {}
