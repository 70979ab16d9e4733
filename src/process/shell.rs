// src/process/shell.rs

//! Production [`ProcessHandle`]: a shell command run as a child process.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{ProcessError, TimeoutKind};
use crate::process::handle::{OutputCallback, ProcessHandle};
use crate::types::OutputStream;

/// How long to keep waiting for the output pipes to close after the child
/// itself has exited (a grandchild may still hold them open).
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Consecutive read errors after which a reader task stops reading a pipe.
const MAX_READ_FAILURES: u32 = 16;

type OutputLine = (OutputStream, String);

/// A command line run through the platform shell (`sh -c` / `cmd /C`).
///
/// Output is read line by line on background Tokio tasks and buffered; it
/// is handed to the output callback whenever the handle is polled, so the
/// callback runs on the polling thread. The handle reports terminated only
/// after the exit status is known and all output has been delivered.
///
/// `start` must be called from within a Tokio runtime.
#[derive(Debug)]
pub struct ShellProcess {
    command: String,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    timeout: Option<Duration>,
    idle_timeout: Option<Duration>,
    state: ShellState,
}

enum ShellState {
    NotStarted,
    Running(Box<RunningChild>),
    Finished { exit_code: Option<i32> },
}

impl std::fmt::Debug for ShellState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellState::NotStarted => f.write_str("NotStarted"),
            ShellState::Running(child) => f
                .debug_struct("Running")
                .field("pid", &child.child.id())
                .field("status", &child.status)
                .finish_non_exhaustive(),
            ShellState::Finished { exit_code } => f
                .debug_struct("Finished")
                .field("exit_code", exit_code)
                .finish(),
        }
    }
}

struct RunningChild {
    child: Child,
    output_rx: mpsc::UnboundedReceiver<OutputLine>,
    on_output: OutputCallback,
    started_at: Instant,
    last_output_at: Instant,
    output_closed: bool,
    status: Option<ExitStatus>,
    exited_at: Option<Instant>,
    killed: bool,
}

impl ShellProcess {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            env: Vec::new(),
            timeout: None,
            idle_timeout: None,
            state: ShellState::NotStarted,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn build_command(&self) -> Command {
        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.command);
            c
        };

        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }

    /// Deliver buffered output and reap the child if it has exited.
    fn poll(&mut self) {
        let ShellState::Running(running) = &mut self.state else {
            return;
        };

        running.drain_output();

        if running.status.is_none() {
            match running.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(cmd = %self.command, ?status, "child process exited");
                    running.status = Some(status);
                    running.exited_at = Some(Instant::now());
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(cmd = %self.command, error = %e, "failed to poll child process");
                    self.state = ShellState::Finished { exit_code: None };
                    return;
                }
            }
        }

        let Some(status) = running.status else {
            return;
        };

        let grace_expired = running
            .exited_at
            .is_some_and(|at| at.elapsed() >= OUTPUT_DRAIN_GRACE);

        if running.output_closed || grace_expired {
            if !running.output_closed {
                debug!(
                    cmd = %self.command,
                    "output pipes still open after exit; finishing without them"
                );
            }
            self.state = ShellState::Finished {
                exit_code: status.code(),
            };
        }
    }
}

impl RunningChild {
    fn drain_output(&mut self) {
        loop {
            match self.output_rx.try_recv() {
                Ok((stream, line)) => {
                    self.last_output_at = Instant::now();
                    (self.on_output)(stream, &line);
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.output_closed = true;
                    break;
                }
            }
        }
    }

    fn kill(&mut self, command: &str) {
        if self.killed {
            return;
        }
        if let Err(e) = self.child.start_kill() {
            warn!(cmd = %command, error = %e, "failed to kill timed out process");
        }
        self.killed = true;
    }
}

impl ProcessHandle for ShellProcess {
    fn start(&mut self, on_output: OutputCallback) -> Result<(), ProcessError> {
        if !matches!(self.state, ShellState::NotStarted) {
            debug!(cmd = %self.command, "start called on already started process; ignoring");
            return Ok(());
        }

        if tokio::runtime::Handle::try_current().is_err() {
            self.state = ShellState::Finished { exit_code: None };
            return Err(ProcessError::Spawn(std::io::Error::other(
                "ShellProcess::start requires a Tokio runtime",
            )));
        }

        let mut child = match self.build_command().spawn() {
            Ok(child) => child,
            Err(e) => {
                self.state = ShellState::Finished { exit_code: None };
                return Err(ProcessError::Spawn(e));
            }
        };

        info!(cmd = %self.command, pid = ?child.id(), "started process");

        let (tx, rx) = mpsc::unbounded_channel::<OutputLine>();
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, OutputStream::Out, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, OutputStream::Err, tx.clone());
        }
        drop(tx);

        let now = Instant::now();
        self.state = ShellState::Running(Box::new(RunningChild {
            child,
            output_rx: rx,
            on_output,
            started_at: now,
            last_output_at: now,
            output_closed: false,
            status: None,
            exited_at: None,
            killed: false,
        }));

        Ok(())
    }

    fn is_started(&self) -> bool {
        !matches!(self.state, ShellState::NotStarted)
    }

    fn is_running(&mut self) -> bool {
        self.poll();
        matches!(self.state, ShellState::Running(_))
    }

    fn is_terminated(&mut self) -> bool {
        self.poll();
        matches!(self.state, ShellState::Finished { .. })
    }

    fn check_timeout(&mut self) -> Result<(), ProcessError> {
        self.poll();

        let running = match &mut self.state {
            ShellState::NotStarted => return Err(ProcessError::NotStarted),
            ShellState::Finished { .. } => return Ok(()),
            ShellState::Running(running) => running,
        };
        if running.status.is_some() || running.killed {
            return Ok(());
        }

        if let Some(limit) = self.timeout {
            let ran_for = running.started_at.elapsed();
            if ran_for > limit {
                running.kill(&self.command);
                return Err(ProcessError::TimedOut {
                    kind: TimeoutKind::Overall,
                    after: ran_for,
                });
            }
        }

        if let Some(limit) = self.idle_timeout {
            let idle_for = running.last_output_at.elapsed();
            if idle_for > limit {
                running.kill(&self.command);
                return Err(ProcessError::TimedOut {
                    kind: TimeoutKind::Idle,
                    after: idle_for,
                });
            }
        }

        Ok(())
    }

    fn command_line(&self) -> String {
        self.command.clone()
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn set_idle_timeout(&mut self, timeout: Option<Duration>) {
        self.idle_timeout = timeout;
    }

    fn exit_code(&self) -> Option<i32> {
        match self.state {
            ShellState::Finished { exit_code } => exit_code,
            _ => None,
        }
    }
}

/// Forward each line of `reader` over `tx` until EOF.
///
/// Lines are decoded lossily, so output that is not valid UTF-8 still
/// arrives. The pipe is read to EOF even after the receiver is gone or a
/// read fails, so the child never sees a closed pipe because of us.
fn spawn_line_reader<R>(reader: R, stream: OutputStream, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut forward = true;
        let mut failures = 0u32;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    failures = 0;
                    if forward && tx.send((stream, decode_line(&buf))).is_err() {
                        forward = false;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    failures += 1;
                    debug!(?stream, error = %e, failures, "error reading child output");
                    if failures >= MAX_READ_FAILURES {
                        warn!(?stream, error = %e, "giving up on child output");
                        break;
                    }
                }
            }
        }
    });
}

/// Strip the line terminator (`\n` or `\r\n`) and decode lossily.
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

