// src/process/mod.rs

//! Child processes as seen by the scheduler.
//!
//! - [`handle`] defines the `ProcessHandle` trait the scheduler drives.
//! - [`shell`] provides `ShellProcess`, the production implementation on top
//!   of `tokio::process`.
//! - [`cmdline`] has quoting and self-invocation helpers for building the
//!   command lines that `ShellProcess` runs.

pub mod cmdline;
pub mod handle;
pub mod shell;

pub use handle::{OutputCallback, ProcessHandle};
pub use shell::ShellProcess;
