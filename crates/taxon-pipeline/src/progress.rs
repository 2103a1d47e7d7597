//! Phase progress reporting.
//!
//! Each completing task increments an atomic counter; completions are logged
//! at a stride derived from the total. No polling loop wakes up to read the
//! counter.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

/// Progress counter for one phase of one level.
pub struct Progress {
    phase: &'static str,
    level: usize,
    total: usize,
    stride: usize,
    completed: AtomicUsize,
}

impl Progress {
    pub fn new(phase: &'static str, level: usize, total: usize) -> Self {
        Self {
            phase,
            level,
            total,
            stride: (total / 10).max(1),
            completed: AtomicUsize::new(0),
        }
    }

    /// Record one completed task.
    pub fn tick(&self) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.stride == 0 || done == self.total {
            info!(
                phase = self.phase,
                level = self.level,
                completed = done,
                total = self.total,
                "Progress"
            );
        }
    }

    /// Completions recorded so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}
