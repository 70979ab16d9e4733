// src/report/mod.rs

//! Human-readable progress reporting.
//!
//! - [`sink`] defines the `ProgressSink` trait and the stock sinks.
//! - [`format`] holds the exact wording of every progress line.
//!
//! [`Reporter`] is the cloneable handle the scheduler and the per-process
//! output callbacks share; it turns scheduler events into formatted lines
//! and forwards them to the sink.

pub mod format;
pub mod sink;

use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use sink::{BufferedSink, ConsoleSink, NullSink, ProgressLine, ProgressSink};

use crate::types::{LineStyle, OutputStream, Verbosity};

#[derive(Clone)]
pub struct Reporter {
    sink: Arc<Mutex<Box<dyn ProgressSink>>>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(NullSink)
    }
}

impl Reporter {
    pub fn new<S: ProgressSink + 'static>(sink: S) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    pub fn line(&self, verbosity: Verbosity, style: LineStyle, text: impl Into<String>) {
        let line = ProgressLine {
            text: text.into(),
            style,
            verbosity,
        };
        sink::lock(&self.sink).write_line(&line);
    }

    /// Forward a raw output chunk from process `key`, one line at a time,
    /// followed by a blank separator line.
    pub fn output_chunk(&self, stream: OutputStream, key: &str, chunk: &str) {
        for line in format::chunk_lines(chunk) {
            self.line(
                Verbosity::Normal,
                stream.into(),
                format::output_line(stream, key, line),
            );
        }
        self.line(Verbosity::Normal, LineStyle::Plain, "");
    }

    pub fn process_started(&self, command_line: &str) {
        self.line(Verbosity::Verbose, LineStyle::Plain, "");
        self.line(
            Verbosity::Verbose,
            LineStyle::Plain,
            format::started_notice(command_line),
        );
    }

    pub fn batch_started<S: AsRef<str>>(&self, elapsed: Duration, keys: &[S]) {
        self.line(Verbosity::Normal, LineStyle::Plain, "");
        self.line(
            Verbosity::Normal,
            LineStyle::Plain,
            format::batch_started(elapsed, keys),
        );
    }

    pub fn tick(&self, drained: bool, elapsed: Duration, done: usize, total: usize) {
        self.line(
            Verbosity::Normal,
            LineStyle::Plain,
            format::tick(drained, elapsed, done, total),
        );
    }
}
