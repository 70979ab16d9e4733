// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod errors;
pub mod logging;
pub mod process;
pub mod queue;
pub mod report;
pub mod types;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, JobFile};
use crate::process::{ProcessHandle, ShellProcess};
use crate::queue::QueuedProcessor;
use crate::report::{ConsoleSink, Reporter};
use crate::types::Verbosity;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading
/// - the console progress sink
/// - the queued processor, fed with one `ShellProcess` per job
///
/// Returns `Ok(true)` when every job exited successfully.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut jobs = load_and_validate(&config_path)
        .with_context(|| format!("loading job file {:?}", config_path))?;

    if let Some(concurrency) = args.concurrency {
        jobs.settings.concurrency = concurrency;
    }

    if args.dry_run {
        print_dry_run(&jobs);
        return Ok(true);
    }

    let verbosity = if args.verbose {
        Verbosity::Verbose
    } else {
        jobs.verbosity
    };
    let reporter = Reporter::new(ConsoleSink::new(verbosity, args.color));

    let mut processor: QueuedProcessor<ShellProcess> = QueuedProcessor::new(reporter, jobs.settings);
    processor.on_terminated(|key, process| match process.exit_code() {
        Some(0) => debug!(key, "job succeeded"),
        Some(code) => warn!(key, exit_code = code, "job failed"),
        None => warn!(key, "job ended without an exit code (killed or never spawned)"),
    });
    processor.add_processes(jobs.processes(), false)?;

    processor.wait().await;

    let summary = processor.summary();
    info!(
        total = summary.total,
        failed = summary.failed.len(),
        "run finished"
    );
    if !summary.failed.is_empty() {
        eprintln!(
            "{} of {} jobs failed: [{}]",
            summary.failed.len(),
            summary.total,
            summary.failed.join("], [")
        );
    }

    Ok(summary.all_succeeded())
}

/// Simple dry-run output: print settings and resolved commands.
fn print_dry_run(jobs: &JobFile) {
    println!("procqueue dry-run");
    println!("  config.concurrency = {}", jobs.settings.concurrency);
    println!("  config.timeout = {:?}", jobs.settings.timeout);
    println!("  config.idle_timeout = {:?}", jobs.settings.idle_timeout);
    println!("  config.poll_interval = {:?}", jobs.settings.poll_interval);
    println!();

    println!("jobs ({}):", jobs.jobs.len());
    for (key, job) in jobs.jobs.iter() {
        println!("  - {key}");
        println!("      cmd: {}", job.command);
        if let Some(ref cwd) = job.cwd {
            println!("      cwd: {}", cwd.display());
        }
        if !job.env.is_empty() {
            println!("      env: {:?}", job.env);
        }
    }

    debug!("dry-run complete (no execution)");
}
