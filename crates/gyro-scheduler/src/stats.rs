//! Atomic pass counters.
//!
//! Counters are written by the scheduling thread and read from any thread.
//! All counters use `Ordering::Relaxed`: they are independent metrics and
//! need no synchronization with other memory operations.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot returned by [`LoopCounters::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoopStats {
    /// Passes completed across all runs
    pub total_passes: u64,
    /// Passes whose work exceeded the frame budget
    pub overrun_passes: u64,
    /// Clock ticks dropped because a pass was still in flight (offloaded dispatch)
    pub skipped_ticks: u64,
    /// Runs that ended in a phase fault
    pub faults: u64,
    /// Runs started
    pub runs: u64,
}

/// Lock-free counters updated by the frame scheduler.
#[derive(Debug, Default)]
pub struct LoopCounters {
    total_passes: AtomicU64,
    overrun_passes: AtomicU64,
    skipped_ticks: AtomicU64,
    faults: AtomicU64,
    runs: AtomicU64,
}

impl LoopCounters {
    /// Create zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_passes: AtomicU64::new(0),
            overrun_passes: AtomicU64::new(0),
            skipped_ticks: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            runs: AtomicU64::new(0),
        }
    }

    /// Count a completed pass.
    #[inline]
    pub fn inc_pass(&self) {
        self.total_passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a pass that overran its budget.
    #[inline]
    pub fn inc_overrun(&self) {
        self.overrun_passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a dropped clock tick.
    #[inline]
    pub fn inc_skipped_tick(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a run that ended in a fault.
    #[inline]
    pub fn inc_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a started run.
    #[inline]
    pub fn inc_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> LoopStats {
        LoopStats {
            total_passes: self.total_passes.load(Ordering::Relaxed),
            overrun_passes: self.overrun_passes.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            runs: self.runs.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counters_start_at_zero() {
        assert_eq!(LoopCounters::new().snapshot(), LoopStats::default());
    }

    #[test]
    fn test_increments() {
        let counters = LoopCounters::new();
        counters.inc_run();
        counters.inc_pass();
        counters.inc_pass();
        counters.inc_overrun();
        counters.inc_skipped_tick();
        counters.inc_fault();

        let stats = counters.snapshot();
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.total_passes, 2);
        assert_eq!(stats.overrun_passes, 1);
        assert_eq!(stats.skipped_ticks, 1);
        assert_eq!(stats.faults, 1);
    }

    #[test]
    fn test_concurrent_increments() {
        let counters = Arc::new(LoopCounters::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counters = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counters.inc_pass();
                    }
                })
            })
            .collect();

        for handle in handles {
            assert!(matches!(handle.join(), Ok(_)), "Thread should not panic");
        }

        assert_eq!(counters.snapshot().total_passes, 4000);
    }
}
