// src/logging.rs

//! Diagnostic logging via `tracing` + `tracing-subscriber`.
//!
//! Progress lines (the `STARTED ...` / `WAITING ...` text) are not logs; they
//! go through [`crate::report`] to stdout. Logs go to stderr.
//!
//! Filter selection, first match wins:
//! 1. `--log-level` on the command line, applied to every target;
//! 2. `PROCQUEUE_LOG`, parsed as an `EnvFilter` directive string
//!    (e.g. `"debug"` or `"procqueue::queue=trace,warn"`);
//! 3. `warn`, so a normal run only shows progress output.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

const ENV_VAR: &str = "PROCQUEUE_LOG";

/// Install the global subscriber. Call once, at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("initialising logging: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directive(level));
    }

    match std::env::var(ENV_VAR) {
        Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec.trim())
            .unwrap_or_else(|e| {
                eprintln!("ignoring invalid {ENV_VAR}: {e}");
                EnvFilter::new("warn")
            }),
        _ => EnvFilter::new("warn"),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
