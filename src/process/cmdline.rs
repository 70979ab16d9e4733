// src/process/cmdline.rs

//! Helpers for building command lines, in particular for re-invoking the
//! current executable as a child process.

use std::path::PathBuf;

use crate::errors::{QueueError, Result};

/// Quote a single argument for a POSIX shell.
///
/// Arguments made only of "safe" characters are returned unchanged; anything
/// else is wrapped in single quotes, with embedded single quotes escaped as
/// `'\''`. The empty string becomes `''`.
pub fn quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    let safe = arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_./:=@%+,-".contains(c));
    if safe {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Quote every argument and join them with single spaces.
pub fn join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|a| quote(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prefix `command` with a console executable.
///
/// `console` defaults to the currently running executable.
pub fn console(command: &str, console: Option<&str>) -> Result<String> {
    let console = match console {
        Some(c) => c.to_string(),
        None => quote(&current_executable()?.to_string_lossy()),
    };

    if command.is_empty() {
        Ok(console)
    } else {
        Ok(format!("{console} {command}"))
    }
}

/// Command line that re-invokes the current executable with `args`.
pub fn self_command<S: AsRef<str>>(args: &[S]) -> Result<String> {
    console(&join(args), None)
}

fn current_executable() -> Result<PathBuf> {
    std::env::current_exe()
        .map_err(|e| QueueError::ExecutableNotFound(format!("current executable: {e}")))
}
