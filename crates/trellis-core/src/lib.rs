//! Core systems for Trellis.
//!
//! This crate provides the foundations the file access layer is built on:
//!
//! - **Signal System**: Type-safe callback fan-out for change notifications
//! - **Async Runtime**: Tokio runtime that runs asynchronous I/O and hands
//!   results back through completion callbacks (requires the `tokio` feature)
//! - **Completions**: Futures that settle when a completion callback fires
//!   (requires the `tokio` feature)
//! - **Logging**: Target names used by `tracing` instrumentation
//!
//! # Signal Example
//!
//! ```
//! use trellis_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```

#[cfg(feature = "tokio")]
pub mod async_runtime;
#[cfg(feature = "tokio")]
pub mod completion;
mod error;
pub mod logging;
pub mod signal;

#[cfg(feature = "tokio")]
pub use completion::{Completer, Completion, completion_channel};
pub use error::CompletionDropped;
pub use signal::{ConnectionId, Signal, Slot};
