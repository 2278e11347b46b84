//! Frame scheduler: the pacing loop behind [`FrameLoop::start`](crate::FrameLoop::start).
//!
//! Each inline pass:
//! 1. Checks the cancellation signal
//! 2. Rolls the rate window if a second has elapsed
//! 3. Runs input, update (with delta time) and render
//! 4. Records the completion timestamp and counts the pass
//! 5. Waits out whatever remains of the frame budget
//!
//! On cancellation the rate window is rolled once more, so a run stopped
//! right after its first full second still publishes a rate.
//!
//! A pass that overruns its budget is followed immediately by the next one.
//! Missed time is never caught up, so sustained overload lowers the achieved
//! rate instead of producing a burst of passes.

use std::time::{Duration, Instant};

use tracing::info;

use crate::callbacks::CallbackSet;
use crate::config::LoopConfig;
use crate::fault::PhaseFault;
use crate::handle::LoopShared;
use crate::lifecycle::RunToken;
use crate::pacing;
use crate::rate::RateMeter;

/// One run of the frame loop.
///
/// Borrowed state only; the scheduler lives for the duration of `start`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameScheduler<'a> {
    shared: &'a LoopShared,
    config: &'a LoopConfig,
    token: RunToken,
}

impl<'a> FrameScheduler<'a> {
    pub(crate) fn new(shared: &'a LoopShared, config: &'a LoopConfig, token: RunToken) -> Self {
        Self {
            shared,
            config,
            token,
        }
    }

    /// Whether this run has not been cancelled or superseded.
    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.shared.lifecycle.is_current(self.token)
    }

    pub(crate) fn shared(&self) -> &'a LoopShared {
        self.shared
    }

    /// Run passes on the calling thread until cancelled or a phase faults.
    pub(crate) fn run_inline(&self, callbacks: &mut CallbackSet) -> Result<(), PhaseFault> {
        let loop_start = Instant::now();
        let mut meter = RateMeter::new(loop_start);
        let mut last_completion = loop_start;
        let mut completed: u64 = 0;

        while self.is_active() {
            let pass_start = Instant::now();
            self.roll_rate(&mut meter, pass_start);

            let pass = completed.wrapping_add(1);
            callbacks.run_pass(pass, last_completion)?;

            last_completion = Instant::now();
            completed = pass;
            let within_budget = self.complete_pass(&mut meter, pass, pass_start, last_completion);

            if within_budget {
                let budget = self.shared.frame_budget();
                if let Some(deadline) = pass_start.checked_add(budget) {
                    pacing::wait_until(self.config.pacing, deadline);
                }
            }
        }

        // A window that filled up during the last wait is still published
        self.roll_rate(&mut meter, Instant::now());
        Ok(())
    }

    /// Publish the rate window if it has rolled over.
    pub(crate) fn roll_rate(&self, meter: &mut RateMeter, now: Instant) {
        if let Some(rate) = meter.maybe_roll(now) {
            self.shared.publish_rate(rate);
        }
    }

    /// Account a finished pass. Returns `false` when it overran the budget.
    pub(crate) fn complete_pass(
        &self,
        meter: &mut RateMeter,
        pass: u64,
        pass_start: Instant,
        completed_at: Instant,
    ) -> bool {
        meter.record_pass();
        self.shared.counters.inc_pass();

        if self.config.debug {
            info!(
                pass,
                current_rate = self.shared.current_rate(),
                target_rate = self.shared.target_rate(),
                "fps"
            );
        }

        let elapsed = completed_at.saturating_duration_since(pass_start);
        let within_budget = elapsed < self.shared.frame_budget();
        if !within_budget {
            self.shared.counters.inc_overrun();
        }
        within_budget
    }
}

/// Time left in the frame budget for a pass that started at `pass_start`.
pub(crate) fn remaining_budget(budget: Duration, pass_start: Instant, now: Instant) -> Duration {
    budget.saturating_sub(now.saturating_duration_since(pass_start))
}
