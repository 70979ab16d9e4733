// src/clock.rs

//! Time sources for the scheduler.
//!
//! The scheduler needs two different notions of time:
//! - wall-clock seconds, to throttle `tick()` to once per second boundary;
//! - a monotonic stopwatch, for the elapsed time shown in progress lines.
//!
//! Both are behind [`Clock`] so tests can drive time by hand with
//! [`ManualClock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Current wall-clock time in whole seconds since the Unix epoch.
    fn unix_secs(&self) -> u64;

    /// Monotonic time elapsed since this clock was created.
    fn elapsed(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn unix_secs(&self) -> u64 {
        (**self).unix_secs()
    }

    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

/// Real clock: `SystemTime` for the throttle, `Instant` for the stopwatch.
#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    /// Create a clock whose stopwatch starts now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn unix_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Hand-driven clock for tests.
///
/// Share it with the scheduler through an `Arc` and move time forward with
/// [`ManualClock::advance`].
#[derive(Debug, Default)]
pub struct ManualClock {
    unix_secs: AtomicU64,
    elapsed_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(unix_secs: u64) -> Self {
        Self {
            unix_secs: AtomicU64::new(unix_secs),
            elapsed_ms: AtomicU64::new(0),
        }
    }

    /// Move both the wall clock and the stopwatch forward.
    pub fn advance(&self, by: Duration) {
        let ms = by.as_millis() as u64;
        let before = self.elapsed_ms.fetch_add(ms, Ordering::SeqCst);
        // Wall-clock seconds tick over whenever the accumulated milliseconds
        // cross a second boundary.
        let crossed = (before + ms) / 1000 - before / 1000;
        self.unix_secs.fetch_add(crossed, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn unix_secs(&self) -> u64 {
        self.unix_secs.load(Ordering::SeqCst)
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

/// Format an elapsed duration as `mm:ss` (minutes wrap at one hour).
pub fn format_mm_ss(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", (secs / 60) % 60, secs % 60)
}
