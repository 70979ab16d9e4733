// src/queue/collector.rs

//! The process registry.
//!
//! [`ProcessCollector`] partitions every registered process into exactly one
//! of three insertion-ordered sets: open, running and terminated. It knows
//! nothing about concurrency limits, clocks or output; the scheduler drives
//! it through [`ProcessCollector::mark_running`] and
//! [`ProcessCollector::mark_terminated`].

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::errors::{QueueError, Result};
use crate::types::ProcessKey;

/// Which of the three sets a key currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Open,
    Running,
    Terminated,
}

#[derive(Debug)]
pub struct ProcessCollector<H> {
    open: IndexMap<ProcessKey, H>,
    running: IndexMap<ProcessKey, H>,
    terminated: IndexMap<ProcessKey, H>,
}

impl<H> Default for ProcessCollector<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ProcessCollector<H> {
    pub fn new() -> Self {
        Self {
            open: IndexMap::new(),
            running: IndexMap::new(),
            terminated: IndexMap::new(),
        }
    }

    /// Register a batch of processes as open.
    ///
    /// The batch is all-or-nothing: an empty key, a key that is already known
    /// in any state, or a key repeated inside the batch rejects the whole
    /// batch and leaves the registry untouched.
    pub fn add_processes<K, I>(&mut self, processes: I) -> Result<()>
    where
        K: Into<ProcessKey>,
        I: IntoIterator<Item = (K, H)>,
    {
        let batch: Vec<(ProcessKey, H)> = processes
            .into_iter()
            .map(|(key, handle)| (key.into(), handle))
            .collect();

        let mut seen: HashSet<&str> = HashSet::with_capacity(batch.len());
        for (key, _) in &batch {
            if key.is_empty() {
                return Err(QueueError::InvalidInput(
                    "process key must not be empty".to_string(),
                ));
            }
            if self.state_of(key).is_some() || !seen.insert(key.as_str()) {
                warn!(key = %key, "rejecting registration batch with duplicate key");
                return Err(QueueError::DuplicateKey(key.clone()));
            }
        }

        for (key, handle) in batch {
            debug!(key = %key, "registered open process");
            self.open.insert(key, handle);
        }

        Ok(())
    }

    /// Move `key` from open to running.
    ///
    /// Returns `false` (and changes nothing) if `key` is not open.
    pub fn mark_running(&mut self, key: &str) -> bool {
        match self.open.shift_remove_entry(key) {
            Some((key, handle)) => {
                debug!(key = %key, "open -> running");
                self.running.insert(key, handle);
                true
            }
            None => false,
        }
    }

    /// Move `key` to terminated.
    ///
    /// An open key is first forced through running, so callers never need a
    /// separate `mark_running`. Returns `false` (and changes nothing) if `key`
    /// is neither open nor running.
    pub fn mark_terminated(&mut self, key: &str) -> bool {
        self.mark_running(key);

        match self.running.shift_remove_entry(key) {
            Some((key, handle)) => {
                debug!(key = %key, "running -> terminated");
                self.terminated.insert(key, handle);
                true
            }
            None => false,
        }
    }

    pub fn open(&self) -> &IndexMap<ProcessKey, H> {
        &self.open
    }

    pub fn running(&self) -> &IndexMap<ProcessKey, H> {
        &self.running
    }

    pub fn terminated(&self) -> &IndexMap<ProcessKey, H> {
        &self.terminated
    }

    /// Mutable access to a running handle, for polling it in place.
    ///
    /// Membership cannot be changed through this; only handle state.
    pub(crate) fn running_handle_mut(&mut self, key: &str) -> Option<&mut H> {
        self.running.get_mut(key)
    }

    /// Look up a handle in whichever set currently holds it.
    pub fn get(&self, key: &str) -> Option<&H> {
        self.open
            .get(key)
            .or_else(|| self.running.get(key))
            .or_else(|| self.terminated.get(key))
    }

    pub fn state_of(&self, key: &str) -> Option<ProcessState> {
        if self.open.contains_key(key) {
            Some(ProcessState::Open)
        } else if self.running.contains_key(key) {
            Some(ProcessState::Running)
        } else if self.terminated.contains_key(key) {
            Some(ProcessState::Terminated)
        } else {
            None
        }
    }

    /// Total number of registered processes, across all three sets.
    pub fn len(&self) -> usize {
        self.open.len() + self.running.len() + self.terminated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` once nothing is left open or running.
    pub fn is_drained(&self) -> bool {
        self.open.is_empty() && self.running.is_empty()
    }
}
