// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `procqueue`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procqueue",
    version,
    about = "Run a set of shell jobs with a cap on how many run at once.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    ///
    /// Default: `Procqueue.toml` in the current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of jobs running at once (0 = unlimited).
    ///
    /// Overrides `[config].concurrency` from the job file.
    #[arg(long, short = 'j', value_name = "N")]
    pub concurrency: Option<usize>,

    /// Also print verbose progress lines (e.g. each started command line).
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Colour job output (stdout green, stderr red).
    #[arg(long)]
    pub color: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCQUEUE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved jobs, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
