//! Trellis - file access behind a pluggable provider.
//!
//! This is the umbrella crate. It re-exports the core primitives from
//! `trellis-core` and adds the [`file`] module.
//!
//! # Example
//!
//! ```no_run
//! use trellis::file::{read_file, write_file};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     write_file("greeting.txt", "hello")?;
//!     println!("{}", read_file("greeting.txt"));
//!     Ok(())
//! }
//! ```

pub use trellis_core::*;

pub mod file;
