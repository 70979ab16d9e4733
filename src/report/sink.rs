// src/report/sink.rs

//! Progress sinks: where human-readable progress lines end up.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::types::{LineStyle, Verbosity};

/// One line of progress text plus how it should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLine {
    pub text: String,
    pub style: LineStyle,
    pub verbosity: Verbosity,
}

/// Line-oriented writer for progress output.
///
/// Sinks decide themselves whether to show `Verbose` lines.
pub trait ProgressSink: Send {
    fn write_line(&mut self, line: &ProgressLine);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn write_line(&mut self, _line: &ProgressLine) {}
}

/// Collects lines in memory.
///
/// Clones share the same buffer, so a test can hand one clone to the
/// scheduler and read progress back through another.
#[derive(Debug, Clone)]
pub struct BufferedSink {
    verbosity: Verbosity,
    lines: Arc<Mutex<Vec<ProgressLine>>>,
}

impl BufferedSink {
    /// Buffer lines up to and including `verbosity`.
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of everything buffered so far.
    pub fn lines(&self) -> Vec<ProgressLine> {
        lock(&self.lines).clone()
    }

    /// Return buffered text (one line per entry) and clear the buffer.
    pub fn fetch(&self) -> String {
        let mut guard = lock(&self.lines);
        let mut out = String::new();
        for line in guard.drain(..) {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

impl Default for BufferedSink {
    fn default() -> Self {
        Self::new(Verbosity::Normal)
    }
}

impl ProgressSink for BufferedSink {
    fn write_line(&mut self, line: &ProgressLine) {
        if line.verbosity <= self.verbosity {
            lock(&self.lines).push(line.clone());
        }
    }
}

/// Writes progress to stdout, optionally with ANSI colours.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    verbosity: Verbosity,
    decorated: bool,
}

impl ConsoleSink {
    pub fn new(verbosity: Verbosity, decorated: bool) -> Self {
        Self {
            verbosity,
            decorated,
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn write_line(&mut self, line: &ProgressLine) {
        if line.verbosity > self.verbosity {
            return;
        }

        let mut stdout = std::io::stdout().lock();
        let result = if self.decorated {
            match line.style {
                LineStyle::Plain => writeln!(stdout, "{}", line.text),
                LineStyle::Info => writeln!(stdout, "\x1b[32m{}\x1b[0m", line.text),
                LineStyle::Error => writeln!(stdout, "\x1b[37;41m{}\x1b[0m", line.text),
            }
        } else {
            writeln!(stdout, "{}", line.text)
        };

        // Closed stdout, e.g. piped into `head`.
        if let Err(e) = result {
            tracing::debug!(error = %e, "failed to write progress line to stdout");
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
