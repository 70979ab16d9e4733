#![allow(dead_code)]

use indexmap::IndexMap;
use procqueue::config::{ConfigSection, JobConfig, JobFile, RawJobFile};

/// Builder for `JobFile` to simplify test setup.
pub struct JobFileBuilder {
    config: RawJobFile,
}

impl JobFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawJobFile {
                config: ConfigSection::default(),
                job: IndexMap::new(),
            },
        }
    }

    pub fn with_job(mut self, key: &str, job: JobConfig) -> Self {
        self.config.job.insert(key.to_string(), job);
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.config.concurrency = concurrency;
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.config.config.timeout = timeout.to_string();
        self
    }

    pub fn idle_timeout(mut self, timeout: &str) -> Self {
        self.config.config.idle_timeout = timeout.to_string();
        self
    }

    pub fn poll_interval(mut self, interval: &str) -> Self {
        self.config.config.poll_interval = interval.to_string();
        self
    }

    pub fn raw(self) -> RawJobFile {
        self.config
    }

    pub fn build(self) -> JobFile {
        JobFile::try_from(self.config).expect("Failed to build valid job file from builder")
    }
}

impl Default for JobFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    /// A job running `cmd` through the shell.
    pub fn cmd(cmd: &str) -> Self {
        Self {
            job: JobConfig {
                cmd: Some(cmd.to_string()),
                ..JobConfig::default()
            },
        }
    }

    /// A job given as an argv list.
    pub fn args(args: &[&str]) -> Self {
        Self {
            job: JobConfig {
                args: Some(args.iter().map(|a| a.to_string()).collect()),
                ..JobConfig::default()
            },
        }
    }

    pub fn invoke_self(mut self) -> Self {
        self.job.invoke_self = true;
        self
    }

    pub fn cwd(mut self, dir: &str) -> Self {
        self.job.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.job.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
