#![allow(dead_code)]

pub use procqueue_test_utils::builders;
pub use procqueue_test_utils::{init_tracing, with_timeout, ConcurrencyGauge, FakeProcess};

use std::time::Duration;

use procqueue::queue::ProcessorSettings;

/// Settings for tests: no timeouts, fast polling.
pub fn fast_settings(concurrency: usize) -> ProcessorSettings {
    ProcessorSettings {
        concurrency,
        timeout: None,
        idle_timeout: None,
        poll_interval: Duration::from_millis(10),
    }
}
