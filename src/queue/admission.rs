// src/queue/admission.rs

//! Admission control: how many open processes may start right now.

/// Number of open processes that may be promoted to running.
///
/// - `limit == 0` means unlimited: every open process may start.
/// - otherwise the free slots (`limit - running`, clamped at zero) cap the
///   number of open processes that may start.
///
/// `running` may transiently exceed `limit` (for example when a handle was
/// started out-of-band); the result is then zero, never negative.
pub fn startable(open: usize, running: usize, limit: usize) -> usize {
    if limit == 0 {
        return open;
    }

    limit.saturating_sub(running).min(open)
}
