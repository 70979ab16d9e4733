// src/process/handle.rs

//! The process collaborator seam.
//!
//! The scheduler never constructs processes; it starts and observes values
//! implementing [`ProcessHandle`]. Production code uses
//! [`crate::process::ShellProcess`]; tests provide scripted fakes.

use std::time::Duration;

use crate::errors::ProcessError;
use crate::types::OutputStream;

/// Callback receiving raw output chunks from a started process.
///
/// A chunk may contain several lines; splitting is the receiver's job.
pub type OutputCallback = Box<dyn FnMut(OutputStream, &str) + Send>;

/// One child process, started at most once.
///
/// Polling methods (`is_running`, `is_terminated`, `check_timeout`) take
/// `&mut self` because they are where a handle reaps its child and delivers
/// pending output to the callback given to [`ProcessHandle::start`].
pub trait ProcessHandle {
    /// Start the process without waiting for it.
    ///
    /// If this returns an error the handle must afterwards report itself as
    /// started and terminated, so the scheduler can account for it.
    fn start(&mut self, on_output: OutputCallback) -> Result<(), ProcessError>;

    fn is_started(&self) -> bool;

    fn is_running(&mut self) -> bool;

    fn is_terminated(&mut self) -> bool;

    /// Enforce the configured timeouts.
    ///
    /// Returns [`ProcessError::TimedOut`] when a timeout fired; the handle
    /// stops the process and later reports terminated.
    fn check_timeout(&mut self) -> Result<(), ProcessError>;

    /// Human-readable command line, for progress output.
    fn command_line(&self) -> String;

    /// Overall run-time limit. `None` disables it.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Limit on time without any output. `None` disables it.
    fn set_idle_timeout(&mut self, timeout: Option<Duration>);

    /// Exit code once terminated; `None` while running or when the process
    /// was killed by a signal or never spawned.
    fn exit_code(&self) -> Option<i32>;

    /// Whether the process terminated with a zero exit code.
    fn is_successful(&self) -> bool {
        self.exit_code() == Some(0)
    }
}
