// src/queue/processor.rs

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::errors::Result;
use crate::process::{OutputCallback, ProcessHandle};
use crate::queue::admission::startable;
use crate::queue::collector::ProcessCollector;
use crate::report::{Reporter, format};
use crate::types::{LineStyle, OutputStream, ProcessKey, Verbosity};

/// Caller-visible completion hook, invoked once per process as it lands in
/// the terminated set.
pub type TerminationCallback<H> = Box<dyn FnMut(&str, &H) + Send>;

/// Scheduler knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorSettings {
    /// Maximum number of simultaneously running processes; `0` = unlimited.
    pub concurrency: usize,
    /// Overall timeout applied to every process the scheduler starts.
    pub timeout: Option<Duration>,
    /// Idle (no output) timeout applied to every process the scheduler starts.
    pub idle_timeout: Option<Duration>,
    /// Sleep between poll cycles in [`QueuedProcessor::wait`].
    pub poll_interval: Duration,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Some(Duration::from_secs(120)),
            idle_timeout: Some(Duration::from_secs(60)),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Outcome of a drained (or partially drained) scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub terminated: usize,
    /// Terminated processes without a zero exit code, in termination order.
    pub failed: Vec<ProcessKey>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.terminated == self.total && self.failed.is_empty()
    }
}

/// Bounded-concurrency process scheduler.
///
/// Owns the [`ProcessCollector`] and drives it from a polling loop:
/// - the start phase promotes open processes to running, FIFO, as far as
///   the admission formula allows;
/// - the tick phase polls running processes, moves finished ones to
///   terminated, fires the termination callback and reports progress.
///
/// Everything happens on the caller's task; the only concurrency is the
/// child processes themselves.
pub struct QueuedProcessor<H> {
    settings: ProcessorSettings,
    collector: ProcessCollector<H>,
    reporter: Reporter,
    on_terminated: Option<TerminationCallback<H>>,
    clock: Box<dyn Clock>,
    /// Wall-clock second of the last tick that actually ran.
    last_tick: Option<u64>,
}

impl<H> std::fmt::Debug for QueuedProcessor<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedProcessor")
            .field("settings", &self.settings)
            .field("open", &self.collector.open().len())
            .field("running", &self.collector.running().len())
            .field("terminated", &self.collector.terminated().len())
            .field("last_tick", &self.last_tick)
            .finish_non_exhaustive()
    }
}

impl<H: ProcessHandle> QueuedProcessor<H> {
    pub fn new(reporter: Reporter, settings: ProcessorSettings) -> Self {
        Self {
            settings,
            collector: ProcessCollector::new(),
            reporter,
            on_terminated: None,
            clock: Box::new(SystemClock::new()),
            last_tick: None,
        }
    }

    /// Replace the time source (tests use [`crate::clock::ManualClock`]).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn set_on_terminated(&mut self, on_terminated: Option<TerminationCallback<H>>) {
        self.on_terminated = on_terminated;
    }

    pub fn on_terminated<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(&str, &H) + Send + 'static,
    {
        self.on_terminated = Some(Box::new(f));
        self
    }

    /// Register processes as open, optionally running a start phase right
    /// away.
    pub fn add_processes<K, I>(&mut self, processes: I, start: bool) -> Result<&mut Self>
    where
        K: Into<ProcessKey>,
        I: IntoIterator<Item = (K, H)>,
    {
        self.collector.add_processes(processes)?;

        if start {
            self.start_batch();
        }

        Ok(self)
    }

    pub fn collector(&self) -> &ProcessCollector<H> {
        &self.collector
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// How many open processes the next start phase may launch.
    pub fn compute_startable(&self) -> usize {
        startable(
            self.collector.open().len(),
            self.collector.running().len(),
            self.settings.concurrency,
        )
    }

    /// Start phase: promote up to [`Self::compute_startable`] open processes,
    /// in registration order.
    ///
    /// Each key is marked running *before* its process is started, so any
    /// output it produces already belongs to a running process. Handles that
    /// were started elsewhere are adopted into running (and use up a slot)
    /// without being started again.
    ///
    /// Returns the keys this call actually started.
    pub fn start_batch(&mut self) -> Vec<ProcessKey> {
        let budget = self.compute_startable();
        if budget == 0 {
            return Vec::new();
        }

        let candidates: Vec<ProcessKey> = self
            .collector
            .open()
            .keys()
            .take(budget)
            .cloned()
            .collect();

        let mut started = Vec::with_capacity(candidates.len());

        for key in candidates {
            self.collector.mark_running(&key);

            let Some(handle) = self.collector.running_handle_mut(&key) else {
                continue;
            };

            if handle.is_started() {
                debug!(key = %key, "process already started elsewhere; adopting as running");
                continue;
            }

            let command_line = handle.command_line();
            self.reporter.process_started(&command_line);

            handle.set_timeout(self.settings.timeout);
            handle.set_idle_timeout(self.settings.idle_timeout);

            let reporter = self.reporter.clone();
            let output_key = key.clone();
            let on_output: OutputCallback = Box::new(move |stream, chunk| {
                reporter.output_chunk(stream, &output_key, chunk);
            });

            match handle.start(on_output) {
                Ok(()) => {
                    info!(key = %key, cmd = %command_line, "process started");
                }
                Err(e) => {
                    warn!(
                        key = %key,
                        cmd = %command_line,
                        error = %e,
                        "failed to start process; it will be reconciled as terminated"
                    );
                    self.reporter.line(
                        Verbosity::Normal,
                        LineStyle::Error,
                        format::output_line(OutputStream::Err, &key, &e.to_string()),
                    );
                }
            }

            started.push(key);
        }

        if !started.is_empty() {
            info!(count = started.len(), keys = ?started, "started batch");
            self.reporter.batch_started(self.clock.elapsed(), &started);
        }

        started
    }

    /// Throttled tick: at most once per wall-clock second.
    ///
    /// Returns `false` when the call was throttled and did nothing.
    pub fn tick(&mut self) -> bool {
        self.tick_every(1)
    }

    /// Tick phase with an explicit throttle interval in seconds.
    ///
    /// `0` disables the throttle. Otherwise the tick is skipped if the last
    /// tick that ran was fewer than `interval_secs` wall-clock seconds ago.
    pub fn tick_every(&mut self, interval_secs: u64) -> bool {
        let now = self.clock.unix_secs();

        if interval_secs > 0 {
            if let Some(last) = self.last_tick {
                if now.saturating_sub(last) < interval_secs {
                    return false;
                }
            }
        }

        let running: Vec<ProcessKey> = self.collector.running().keys().cloned().collect();

        for key in running {
            let Some(handle) = self.collector.running_handle_mut(&key) else {
                continue;
            };

            // A timeout is not an error for the scheduler; the handle stops
            // the process and we pick that up through `is_terminated`.
            match handle.check_timeout() {
                Ok(()) => {}
                Err(e) if e.is_timeout() => {
                    info!(key = %key, error = %e, "process timed out; waiting for it to stop");
                }
                Err(e) => debug!(key = %key, error = %e, "timeout check failed; continuing"),
            }

            if !handle.is_terminated() {
                continue;
            }

            if self.collector.mark_terminated(&key) {
                debug!(key = %key, "process terminated");
                if let Some(callback) = self.on_terminated.as_mut() {
                    if let Some(handle) = self.collector.terminated().get(&key) {
                        callback(&key, handle);
                    }
                }
            }
        }

        let drained = self.collector.is_drained();
        let done = self.collector.terminated().len();
        let total = self.collector.len();

        debug!(
            open = self.collector.open().len(),
            running = self.collector.running().len(),
            done,
            total,
            "tick"
        );
        self.reporter.tick(drained, self.clock.elapsed(), done, total);

        self.last_tick = Some(now);
        true
    }

    /// Run until every registered process has terminated.
    ///
    /// Each cycle runs a start phase and an unthrottled tick, then sleeps for
    /// `poll_interval` if anything is still open or running.
    pub async fn wait(&mut self) {
        info!(
            total = self.collector.len(),
            concurrency = self.settings.concurrency,
            "waiting for processes"
        );

        loop {
            self.start_batch();
            self.tick_every(0);

            if self.collector.is_drained() {
                break;
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }

        info!(total = self.collector.len(), "all processes terminated");
    }

    pub fn summary(&self) -> RunSummary {
        let failed = self
            .collector
            .terminated()
            .iter()
            .filter(|(_, handle)| !handle.is_successful())
            .map(|(key, _)| key.clone())
            .collect();

        RunSummary {
            total: self.collector.len(),
            terminated: self.collector.terminated().len(),
            failed,
        }
    }
}
