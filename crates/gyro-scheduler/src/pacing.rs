//! Pacing waits that hold a pass to its frame budget.

use crate::config::PacingStrategy;
use std::time::{Duration, Instant};

/// Block the calling thread until `deadline` using `strategy`.
///
/// Returns immediately when the deadline has already passed. Sleeping is
/// best-effort: the host may wake the thread late, never early.
pub fn wait_until(strategy: PacingStrategy, deadline: Instant) {
    let now = Instant::now();
    if deadline <= now {
        return;
    }

    let remaining = deadline.duration_since(now);
    match strategy {
        PacingStrategy::Sleep => std::thread::sleep(remaining),
        PacingStrategy::SleepAndSpin { spin_threshold_us } => {
            let spin_tail = Duration::from_micros(spin_threshold_us);
            if remaining > spin_tail {
                std::thread::sleep(remaining.saturating_sub(spin_tail));
            }

            // Busy-spin for final precision
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
        }
    }
}
