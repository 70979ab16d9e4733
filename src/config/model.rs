// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::process::ShellProcess;
use crate::queue::ProcessorSettings;
use crate::types::Verbosity;

/// Job file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// concurrency = 6
/// timeout = "120s"
/// idle_timeout = "60s"
///
/// [job.build]
/// cmd = "make build"
///
/// [job.lint]
/// args = ["cargo", "clippy", "--all"]
/// ```
///
/// All sections are optional and have reasonable defaults. Jobs keep the
/// order in which they appear in the file; that order is the start order.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawJobFile {
    /// Scheduler behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All jobs from `[job.<key>]`, keyed by process key.
    #[serde(default)]
    pub job: IndexMap<String, JobConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of jobs running at once; `0` means unlimited.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Overall per-job timeout (`"120s"`, `"2m"`, ...); `"0"` disables it.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Per-job timeout without output; `"0"` disables it.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: String,

    /// Pause between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// `"normal"` or `"verbose"` progress output.
    #[serde(default)]
    pub verbosity: Verbosity,
}

fn default_concurrency() -> usize {
    10
}

fn default_timeout() -> String {
    "120s".to_string()
}

fn default_idle_timeout() -> String {
    "60s".to_string()
}

fn default_poll_interval() -> String {
    "1s".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout: default_timeout(),
            idle_timeout: default_idle_timeout(),
            poll_interval: default_poll_interval(),
            verbosity: Verbosity::default(),
        }
    }
}

/// `[job.<key>]` section.
///
/// Exactly one of `cmd` (a shell string) or `args` (an argv list, quoted
/// for the shell) must be given.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct JobConfig {
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub args: Option<Vec<String>>,

    /// Run `args` against this executable instead of as a command of its own.
    #[serde(default)]
    pub invoke_self: bool,

    /// Working directory for the job.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables.
    #[serde(default)]
    pub env: IndexMap<String, String>,
}

/// Validated job file.
///
/// Only obtainable through `TryFrom<RawJobFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct JobFile {
    pub settings: ProcessorSettings,
    pub verbosity: Verbosity,
    pub jobs: IndexMap<String, Job>,
}

/// A job with its command line fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub env: IndexMap<String, String>,
}

impl Job {
    /// Build the (not yet started) process for this job.
    pub fn to_process(&self) -> ShellProcess {
        let mut process = ShellProcess::new(self.command.clone());
        if let Some(ref dir) = self.cwd {
            process = process.current_dir(dir);
        }
        for (key, value) in &self.env {
            process = process.env(key, value);
        }
        process
    }
}

impl JobFile {
    /// Processes for every job, in file order, ready for registration.
    pub fn processes(&self) -> Vec<(String, ShellProcess)> {
        self.jobs
            .iter()
            .map(|(key, job)| (key.clone(), job.to_process()))
            .collect()
    }
}

/// Parse a duration like `"500ms"`, `"30s"`, `"2m"`, `"1h"` or a bare number
/// of seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .unwrap_or(s.len());

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
