// src/queue/mod.rs

//! Bounded-concurrency scheduling.
//!
//! - [`collector`] is the open / running / terminated ledger.
//! - [`admission`] decides how many open processes may start.
//! - [`processor`] is the polling scheduler tying both together.

pub mod admission;
pub mod collector;
pub mod processor;

pub use admission::startable;
pub use collector::{ProcessCollector, ProcessState};
pub use processor::{ProcessorSettings, QueuedProcessor, RunSummary, TerminationCallback};
