//! Logging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     // Initialize tracing (you can customize this)
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Every event is emitted with one of the [`targets`] below, so a filter such
//! as `RUST_LOG=trellis::file::monitor=debug` narrows output to a subsystem.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "trellis_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Async runtime target.
    pub const RUNTIME: &str = "trellis_core::async_runtime";
    /// File access target (adapter and local provider).
    pub const FILE: &str = "trellis::file";
    /// File monitoring target.
    pub const MONITOR: &str = "trellis::file::monitor";
}
