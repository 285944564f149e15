//! Watch a file and log every change.
//!
//! ```text
//! cargo run -p trellis --example monitor -- notes.txt 30
//! ```
//!
//! Reads the file (empty if missing), writes the contents back on the I/O
//! runtime, then logs change events for the given number of seconds
//! (default 10). Set `RUST_LOG=trellis=debug` for more detail.

use std::time::Duration;

use trellis::async_runtime::{AsyncRuntime, AsyncRuntimeConfig};
use trellis::file::FileAccess;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "trellis-monitor.txt".to_string());
    let seconds: u64 = match args.next() {
        Some(value) => value.parse()?,
        None => 10,
    };

    AsyncRuntime::init_global(
        AsyncRuntimeConfig::multi_threaded()
            .with_worker_threads(1)
            .with_thread_name("monitor-io"),
    )?;
    let access = FileAccess::local();

    let content = access.read_file(&path);
    tracing::info!(path = %path, bytes = content.len(), "read");

    access.write_file_async(&path, content).blocking_wait()?;
    tracing::info!(path = %path, "wrote contents back");

    let monitor = access.monitor_file(&path, |changed, event| {
        tracing::info!(path = %changed.display(), %event, "change");
    })?;
    tracing::info!(
        watched = %monitor.watched_path().display(),
        seconds,
        "monitoring, edit the file to see events"
    );

    std::thread::sleep(Duration::from_secs(seconds));
    monitor.cancel();
    tracing::info!("done");
    Ok(())
}
