//! State shared between a running loop and its control handles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{LoopConfig, clamp_target_rate, frame_budget};
use crate::lifecycle::{Lifecycle, RunState};
use crate::stats::{LoopCounters, LoopStats};

/// Everything a handle may read or write while `start` blocks another thread.
#[derive(Debug)]
pub(crate) struct LoopShared {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) counters: LoopCounters,
    target_rate: AtomicU16,
    current_rate: AtomicU16,
    safe_mode: AtomicBool,
}

impl LoopShared {
    pub(crate) fn new(config: &LoopConfig) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            counters: LoopCounters::new(),
            target_rate: AtomicU16::new(config.target_rate.max(1)),
            current_rate: AtomicU16::new(0),
            safe_mode: AtomicBool::new(config.safe_mode),
        }
    }

    pub(crate) fn target_rate(&self) -> u16 {
        self.target_rate.load(Ordering::Acquire)
    }

    pub(crate) fn store_target_rate(&self, rate: u16) {
        self.target_rate.store(rate.max(1), Ordering::Release);
    }

    /// Apply a runtime rate change unless safe mode forbids it.
    pub(crate) fn set_target_rate(&self, rate: i64) -> bool {
        let rate = clamp_target_rate(rate);
        if self.safe_mode.load(Ordering::Acquire) && self.is_running() {
            warn!(
                requested = rate,
                current = self.target_rate(),
                "Ignoring target rate change while running in safe mode"
            );
            return false;
        }

        self.store_target_rate(rate);
        debug!(target_rate = rate, "Target rate updated");
        true
    }

    pub(crate) fn set_safe_mode(&self, enabled: bool) {
        self.safe_mode.store(enabled, Ordering::Release);
    }

    pub(crate) fn frame_budget(&self) -> Duration {
        frame_budget(self.target_rate())
    }

    pub(crate) fn current_rate(&self) -> u16 {
        self.current_rate.load(Ordering::Acquire)
    }

    pub(crate) fn publish_rate(&self, rate: u16) {
        self.current_rate.store(rate, Ordering::Release);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.lifecycle.state() == RunState::Running
    }

    pub(crate) fn stop(&self) {
        if self.lifecycle.request_stop() {
            info!("Frame loop stop requested");
        } else {
            debug!("Stop requested while not running; ignoring");
        }
    }
}

/// Cloneable control handle for a [`FrameLoop`](crate::FrameLoop).
///
/// `start` blocks the thread that calls it, so a handle is how another
/// thread stops the loop or reads its metrics. All methods are lock-free.
///
/// # Example
///
/// ```no_run
/// use gyro_scheduler::FrameLoop;
/// use std::thread;
/// use std::time::Duration;
///
/// let frame_loop = FrameLoop::new().with_update(|_dt| {});
/// let handle = frame_loop.handle();
///
/// thread::spawn(move || {
///     thread::sleep(Duration::from_secs(2));
///     handle.stop();
/// });
///
/// frame_loop.start().expect("update callback is registered");
/// ```
#[derive(Debug, Clone)]
pub struct LoopHandle {
    shared: Arc<LoopShared>,
}

impl LoopHandle {
    pub(crate) fn new(shared: Arc<LoopShared>) -> Self {
        Self { shared }
    }

    /// Request the loop to stop after its in-flight pass. Idempotent.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Whether a run is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.shared.lifecycle.state()
    }

    /// Configured target rate.
    #[must_use]
    pub fn target_rate(&self) -> u16 {
        self.shared.target_rate()
    }

    /// Change the target rate; applied from the next pass.
    ///
    /// Ignored (returns `false`) while running in safe mode.
    pub fn set_target_rate(&self, rate: i64) -> bool {
        self.shared.set_target_rate(rate)
    }

    /// Rate published by the last completed measurement window.
    #[must_use]
    pub fn current_rate(&self) -> u16 {
        self.shared.current_rate()
    }

    /// Snapshot of the pass counters.
    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.shared.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_from_config() {
        let shared = LoopShared::new(&LoopConfig::new().with_target_rate(90));
        assert_eq!(shared.target_rate(), 90);
        assert_eq!(shared.current_rate(), 0);
        assert!(!shared.is_running());
        assert_eq!(shared.frame_budget(), frame_budget(90));
    }

    #[test]
    fn test_zero_rate_in_config_is_floored() {
        let config = LoopConfig {
            target_rate: 0,
            ..LoopConfig::default()
        };
        assert_eq!(LoopShared::new(&config).target_rate(), 1);
    }

    #[test]
    fn test_set_target_rate_clamps() {
        let shared = LoopShared::new(&LoopConfig::default());
        assert!(shared.set_target_rate(-3));
        assert_eq!(shared.target_rate(), 1);
        assert!(shared.set_target_rate(1_000_000));
        assert_eq!(shared.target_rate(), u16::MAX);
    }

    #[test]
    fn test_safe_mode_blocks_changes_only_while_running() {
        let shared = LoopShared::new(&LoopConfig::new().with_safe_mode(true));
        assert!(shared.set_target_rate(30));
        assert_eq!(shared.target_rate(), 30);

        let _ = shared.lifecycle.try_begin();
        assert!(!shared.set_target_rate(120));
        assert_eq!(shared.target_rate(), 30);

        shared.stop();
        assert!(shared.set_target_rate(120));
        assert_eq!(shared.target_rate(), 120);
    }

    #[test]
    fn test_handle_reads_shared_state() {
        let shared = Arc::new(LoopShared::new(&LoopConfig::default()));
        let handle = LoopHandle::new(Arc::clone(&shared));

        shared.publish_rate(59);
        shared.counters.inc_pass();

        assert_eq!(handle.current_rate(), 59);
        assert_eq!(handle.stats().total_passes, 1);
        assert_eq!(handle.run_state(), RunState::Idle);

        handle.stop();
        assert_eq!(handle.run_state(), RunState::Idle);
    }
}
