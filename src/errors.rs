// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Duplicate process key: {0}")]
    DuplicateKey(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Which of the two per-process timeouts fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// Total run time exceeded.
    Overall,
    /// No output for too long.
    Idle,
}

/// Per-process failures reported by a [`crate::process::ProcessHandle`].
///
/// None of these are fatal to the scheduler; they are logged and the handle
/// is expected to converge on a terminated state.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("process timed out ({kind:?}) after {after:?}")]
    TimedOut { kind: TimeoutKind, after: Duration },

    #[error("process has not been started")]
    NotStarted,

    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),
}

impl ProcessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::TimedOut { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, QueueError>;
