// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{JobFile, RawJobFile};
use crate::errors::Result;

/// Load a job file from a given path and return the raw `RawJobFile`.
///
/// This only performs TOML deserialization; it does **not** resolve command
/// lines or check durations. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawJobFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a job file from path and validate it.
///
/// Missing `[config]` keys fall back to their defaults, durations become
/// [`crate::queue::ProcessorSettings`], and every job is resolved into a
/// single shell command line.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobFile> {
    let raw_config = load_from_path(&path)?;
    let config = JobFile::try_from(raw_config)?;
    Ok(config)
}

/// Default job file location: `Procqueue.toml` in the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Procqueue.toml")
}
