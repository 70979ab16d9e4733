// src/report/format.rs

//! Exact wording of the progress lines.
//!
//! These strings are a compatibility surface for anything parsing the
//! output, so they live in one place.

use std::time::Duration;

use crate::clock::format_mm_ss;
use crate::types::OutputStream;

/// `OUT [build] compiling foo`
pub fn output_line(stream: OutputStream, key: &str, line: &str) -> String {
    format!("{stream} [{key}] {line}")
}

/// `started sh -c 'make'`
pub fn started_notice(command_line: &str) -> String {
    format!("started {command_line}")
}

/// `STARTED ... 00:03 sek | 2 processes [a], [b]`
pub fn batch_started<S: AsRef<str>>(elapsed: Duration, keys: &[S]) -> String {
    let keys = keys.iter().map(|k| k.as_ref()).collect::<Vec<_>>();
    format!(
        "STARTED ... {} sek | {} processes [{}]",
        format_mm_ss(elapsed),
        keys.len(),
        keys.join("], [")
    )
}

/// `WAITING ... 00:03 sek | 1/8 done` or ` =DONE= ... 00:09 sek | 8/8 done`
pub fn tick(drained: bool, elapsed: Duration, done: usize, total: usize) -> String {
    format!(
        "{} ... {} sek | {}/{} done",
        if drained { " =DONE=" } else { "WAITING" },
        format_mm_ss(elapsed),
        done,
        total
    )
}

/// Split a raw output chunk into trimmed lines.
///
/// Blank lines inside the chunk are kept as empty strings; an
/// all-whitespace chunk yields nothing.
pub fn chunk_lines(chunk: &str) -> impl Iterator<Item = &str> {
    chunk.trim().lines().map(str::trim)
}
