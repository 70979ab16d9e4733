// src/config/validate.rs

use std::time::Duration;

use indexmap::IndexMap;

use crate::config::model::{parse_duration, ConfigSection, Job, JobConfig, JobFile, RawJobFile};
use crate::errors::{QueueError, Result};
use crate::process::cmdline;
use crate::queue::ProcessorSettings;

impl TryFrom<RawJobFile> for JobFile {
    type Error = QueueError;

    fn try_from(raw: RawJobFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_jobs(&raw)?;
        let settings = validate_global_config(&raw.config)?;

        let mut jobs = IndexMap::with_capacity(raw.job.len());
        for (key, job) in raw.job {
            let resolved = resolve_job(&key, job)?;
            jobs.insert(key, resolved);
        }

        Ok(JobFile {
            settings,
            verbosity: raw.config.verbosity,
            jobs,
        })
    }
}

fn ensure_has_jobs(cfg: &RawJobFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(QueueError::ConfigError(
            "config must contain at least one [job.<key>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &ConfigSection) -> Result<ProcessorSettings> {
    let timeout = optional_duration("timeout", &cfg.timeout)?;
    let idle_timeout = optional_duration("idle_timeout", &cfg.idle_timeout)?;

    let poll_interval = duration("poll_interval", &cfg.poll_interval)?;
    if poll_interval.is_zero() {
        return Err(QueueError::ConfigError(
            "[config].poll_interval must be greater than zero".to_string(),
        ));
    }

    Ok(ProcessorSettings {
        concurrency: cfg.concurrency,
        timeout,
        idle_timeout,
        poll_interval,
    })
}

fn duration(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| QueueError::ConfigError(format!("[config].{field}: {e}")))
}

/// Like [`duration`], but zero means "disabled".
fn optional_duration(field: &str, value: &str) -> Result<Option<Duration>> {
    let d = duration(field, value)?;
    Ok(if d.is_zero() { None } else { Some(d) })
}

fn resolve_job(key: &str, job: JobConfig) -> Result<Job> {
    if key.trim().is_empty() {
        return Err(QueueError::ConfigError(
            "job keys must not be empty".to_string(),
        ));
    }

    let command = match (job.cmd, job.args, job.invoke_self) {
        (Some(_), Some(_), _) => {
            return Err(QueueError::ConfigError(format!(
                "job '{key}' sets both `cmd` and `args`; use one"
            )));
        }
        (Some(_), None, true) => {
            return Err(QueueError::ConfigError(format!(
                "job '{key}' sets `invoke_self`, which requires `args` instead of `cmd`"
            )));
        }
        (Some(cmd), None, false) => cmd,
        (None, Some(args), true) => cmdline::self_command(&args)?,
        (None, Some(args), false) => cmdline::join(&args),
        (None, None, _) => {
            return Err(QueueError::ConfigError(format!(
                "job '{key}' needs either `cmd` or `args`"
            )));
        }
    };

    if command.trim().is_empty() {
        return Err(QueueError::ConfigError(format!(
            "job '{key}' has an empty command"
        )));
    }

    Ok(Job {
        command,
        cwd: job.cwd,
        env: job.env,
    })
}
