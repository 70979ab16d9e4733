use std::fmt;

use serde::Deserialize;

/// Canonical process key type used throughout the crate.
///
/// Keys are supplied by the caller and must be unique among all processes
/// ever registered with one scheduler.
pub type ProcessKey = String;

/// Which pipe a chunk of child output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Out,
    Err,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Out => f.write_str("OUT"),
            OutputStream::Err => f.write_str("ERR"),
        }
    }
}

/// Verbosity level attached to a progress line.
///
/// `Verbose` lines are only shown by sinks configured for verbose output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Normal,
    Verbose,
}

/// Presentation hint for a progress line.
///
/// Output lines from a child's stdout are `Info`, lines from stderr are
/// `Error`; everything the scheduler says about itself is `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Plain,
    Info,
    Error,
}

impl From<OutputStream> for LineStyle {
    fn from(stream: OutputStream) -> Self {
        match stream {
            OutputStream::Out => LineStyle::Info,
            OutputStream::Err => LineStyle::Error,
        }
    }
}
