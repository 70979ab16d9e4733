use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use procqueue::errors::{ProcessError, TimeoutKind};
use procqueue::process::{OutputCallback, ProcessHandle};
use procqueue::types::OutputStream;

/// A scripted process handle that never spawns anything.
///
/// Clones share state, so a test can keep one clone for assertions and
/// register the other with a `QueuedProcessor`.
///
/// Termination is driven either by a poll budget
/// ([`FakeProcess::finishes_after_polls`]) or explicitly by the test
/// ([`FakeProcess::finish`]).
#[derive(Clone)]
pub struct FakeProcess {
    inner: Arc<Mutex<FakeState>>,
}

struct FakeState {
    command: String,
    started: bool,
    terminated: bool,
    exit_code: i32,
    /// Terminate after this many `is_terminated` polls once started.
    polls_until_done: Option<u32>,
    polls: u32,
    /// Output emitted on the first poll after start.
    pending_output: Vec<(OutputStream, String)>,
    on_output: Option<OutputCallback>,
    time_out_on_check: bool,
    fail_start: bool,
    start_calls: u32,
    timeout_checks: u32,
    timeout: Option<Duration>,
    idle_timeout: Option<Duration>,
    gauge: Option<ConcurrencyGauge>,
    /// Counted as live in `gauge` until termination is observed.
    counted: bool,
}

/// Shared high-water mark of processes that were started but not yet seen
/// terminated.
///
/// Attach one gauge to many [`FakeProcess`]es with
/// [`FakeProcess::with_gauge`].
#[derive(Clone, Default)]
pub struct ConcurrencyGauge {
    inner: Arc<Mutex<(usize, usize)>>,
}

impl ConcurrencyGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes currently counted as running.
    pub fn live(&self) -> usize {
        self.inner.lock().unwrap().0
    }

    /// Highest `live` value seen so far.
    pub fn peak(&self) -> usize {
        self.inner.lock().unwrap().1
    }

    fn enter(&self) {
        let mut counts = self.inner.lock().unwrap();
        counts.0 += 1;
        counts.1 = counts.1.max(counts.0);
    }

    fn leave(&self) {
        let mut counts = self.inner.lock().unwrap();
        counts.0 = counts.0.saturating_sub(1);
    }
}

impl FakeProcess {
    /// A process that stays running until [`FakeProcess::finish`] is called.
    pub fn new(command: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                command: command.to_string(),
                started: false,
                terminated: false,
                exit_code: 0,
                polls_until_done: None,
                polls: 0,
                pending_output: Vec::new(),
                on_output: None,
                time_out_on_check: false,
                fail_start: false,
                start_calls: 0,
                timeout_checks: 0,
                timeout: None,
                idle_timeout: None,
                gauge: None,
                counted: false,
            })),
        }
    }

    /// A process that terminates on its first poll after being started.
    pub fn instant(command: &str) -> Self {
        Self::new(command).finishes_after_polls(1)
    }

    pub fn finishes_after_polls(self, polls: u32) -> Self {
        self.state().polls_until_done = Some(polls);
        self
    }

    pub fn with_exit_code(self, code: i32) -> Self {
        self.state().exit_code = code;
        self
    }

    pub fn with_output(self, stream: OutputStream, chunk: &str) -> Self {
        self.state().pending_output.push((stream, chunk.to_string()));
        self
    }

    /// The next `check_timeout` reports a timeout and ends the process.
    pub fn times_out(self) -> Self {
        self.state().time_out_on_check = true;
        self
    }

    /// `start` fails; the process then counts as terminated.
    pub fn fails_to_start(self) -> Self {
        self.state().fail_start = true;
        self
    }

    /// Pretend something outside the scheduler already started this process.
    pub fn already_started(self) -> Self {
        self.state().started = true;
        self
    }

    /// Count this process in `gauge` from a successful `start` until its
    /// termination is observed.
    pub fn with_gauge(self, gauge: &ConcurrencyGauge) -> Self {
        self.state().gauge = Some(gauge.clone());
        self
    }

    /// Let a started process terminate on its next poll.
    pub fn finish(&self) {
        let mut state = self.state();
        if state.started {
            state.terminated = true;
        }
    }

    pub fn start_calls(&self) -> u32 {
        self.state().start_calls
    }

    pub fn timeout_checks(&self) -> u32 {
        self.state().timeout_checks
    }

    pub fn configured_timeouts(&self) -> (Option<Duration>, Option<Duration>) {
        let state = self.state();
        (state.timeout, state.idle_timeout)
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap()
    }

    /// Deliver pending output through the callback, outside the lock.
    fn flush_output(&self) {
        let (output, callback) = {
            let mut state = self.state();
            if !state.started || state.pending_output.is_empty() {
                return;
            }
            (
                std::mem::take(&mut state.pending_output),
                state.on_output.take(),
            )
        };

        if let Some(mut callback) = callback {
            for (stream, chunk) in &output {
                callback(*stream, chunk);
            }
            self.state().on_output = Some(callback);
        }
    }
}

impl ProcessHandle for FakeProcess {
    fn start(&mut self, on_output: OutputCallback) -> Result<(), ProcessError> {
        let mut state = self.state();
        state.start_calls += 1;
        state.started = true;

        if state.fail_start {
            state.terminated = true;
            return Err(ProcessError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("cannot run {}", state.command),
            )));
        }

        state.on_output = Some(on_output);
        if let Some(gauge) = state.gauge.clone() {
            gauge.enter();
            state.counted = true;
        }
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.state().started
    }

    fn is_running(&mut self) -> bool {
        self.flush_output();
        let state = self.state();
        state.started && !state.terminated
    }

    fn is_terminated(&mut self) -> bool {
        self.flush_output();
        let mut state = self.state();
        if !state.started {
            return false;
        }
        if !state.terminated {
            state.polls += 1;
            if let Some(limit) = state.polls_until_done {
                if state.polls >= limit {
                    state.terminated = true;
                }
            }
        }
        if state.terminated && state.counted {
            state.counted = false;
            if let Some(gauge) = &state.gauge {
                gauge.leave();
            }
        }
        state.terminated
    }

    fn check_timeout(&mut self) -> Result<(), ProcessError> {
        let mut state = self.state();
        state.timeout_checks += 1;
        if state.started && !state.terminated && state.time_out_on_check {
            state.time_out_on_check = false;
            state.terminated = true;
            state.exit_code = 143;
            return Err(ProcessError::TimedOut {
                kind: TimeoutKind::Overall,
                after: state.timeout.unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn command_line(&self) -> String {
        self.state().command.clone()
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.state().timeout = timeout;
    }

    fn set_idle_timeout(&mut self, timeout: Option<Duration>) {
        self.state().idle_timeout = timeout;
    }

    fn exit_code(&self) -> Option<i32> {
        let state = self.state();
        if state.terminated && !state.fail_start {
            Some(state.exit_code)
        } else {
            None
        }
    }
}
