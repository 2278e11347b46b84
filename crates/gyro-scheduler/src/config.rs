//! Loop configuration and target-rate validation.
//!
//! Configuration never fails: out-of-range values are clamped to the nearest
//! valid value so the fluent setters stay infallible.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target rate used by a freshly constructed loop (passes per second).
pub const DEFAULT_TARGET_RATE: u16 = 60;

/// Lowest accepted target rate.
pub const MIN_TARGET_RATE: u16 = 1;

/// Highest accepted target rate (the rate is reported as a `u16`).
pub const MAX_TARGET_RATE: u16 = u16::MAX;

/// Default clock tick for offloaded dispatch (milliseconds).
pub const DEFAULT_CLOCK_TICK_MS: u64 = 10;

/// Clamp a requested target rate into `MIN_TARGET_RATE..=MAX_TARGET_RATE`.
#[must_use]
pub fn clamp_target_rate(rate: i64) -> u16 {
    let clamped = rate.clamp(i64::from(MIN_TARGET_RATE), i64::from(MAX_TARGET_RATE));
    u16::try_from(clamped).unwrap_or(MAX_TARGET_RATE)
}

/// Per-pass time budget for a target rate: one second divided by the rate.
#[must_use]
pub fn frame_budget(target_rate: u16) -> Duration {
    Duration::from_secs(1)
        .checked_div(u32::from(target_rate.max(MIN_TARGET_RATE)))
        .unwrap_or(Duration::from_secs(1))
}

/// How the remainder of a pass budget is waited out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PacingStrategy {
    /// Sleep the thread for the remaining budget.
    #[default]
    Sleep,
    /// Sleep until `spin_threshold_us` remain, then busy-spin to the deadline.
    SleepAndSpin {
        /// Tail of the budget spent spinning (microseconds).
        spin_threshold_us: u64,
    },
}

/// Where the phase callbacks execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DispatchMode {
    /// Phases run on the thread that called `start`, one pass after another.
    #[default]
    Inline,
    /// Phases run on a worker thread fed by a fixed clock tick; a tick that
    /// arrives while the previous pass is still running is dropped.
    Offloaded {
        /// Clock tick period (milliseconds).
        clock_tick_ms: u64,
    },
}

impl DispatchMode {
    /// Offloaded dispatch with the default clock tick.
    #[must_use]
    pub const fn offloaded() -> Self {
        Self::Offloaded {
            clock_tick_ms: DEFAULT_CLOCK_TICK_MS,
        }
    }
}

/// Frame loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Target passes per second.
    pub target_rate: u16,

    /// Emit the current rate on every pass.
    pub debug: bool,

    /// Ignore runtime target-rate changes while the loop is running.
    pub safe_mode: bool,

    /// Pacing wait strategy.
    pub pacing: PacingStrategy,

    /// Callback dispatch mode.
    pub dispatch: DispatchMode,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_rate: DEFAULT_TARGET_RATE,
            debug: false,
            safe_mode: false,
            pacing: PacingStrategy::Sleep,
            dispatch: DispatchMode::Inline,
        }
    }
}

impl LoopConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target rate, clamped to the valid range.
    #[must_use]
    pub fn with_target_rate(mut self, rate: i64) -> Self {
        self.target_rate = clamp_target_rate(rate);
        self
    }

    /// Set the debug flag.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set safe mode.
    #[must_use]
    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    /// Set the pacing strategy.
    #[must_use]
    pub fn with_pacing(mut self, pacing: PacingStrategy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the dispatch mode.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Per-pass time budget derived from the target rate.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        frame_budget(self.target_rate)
    }

    /// Normalize values that may have been set directly or deserialized.
    ///
    /// This ensures:
    /// - target_rate >= 1
    /// - the spin tail never exceeds one frame budget
    /// - the offloaded clock tick is at least 1ms
    pub fn normalize(&mut self) {
        self.target_rate = self.target_rate.max(MIN_TARGET_RATE);

        let budget_us = u64::try_from(self.frame_budget().as_micros()).unwrap_or(u64::MAX);
        if let PacingStrategy::SleepAndSpin { spin_threshold_us } = &mut self.pacing {
            *spin_threshold_us = (*spin_threshold_us).min(budget_us);
        }

        if let DispatchMode::Offloaded { clock_tick_ms } = &mut self.dispatch {
            *clock_tick_ms = (*clock_tick_ms).max(1);
        }
    }

    /// Check whether the configuration is already normalized.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized == *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoopConfig::default();
        assert_eq!(config.target_rate, 60);
        assert!(!config.debug);
        assert!(!config.safe_mode);
        assert_eq!(config.pacing, PacingStrategy::Sleep);
        assert_eq!(config.dispatch, DispatchMode::Inline);
        assert!(config.is_valid());
    }

    #[test]
    fn test_clamp_target_rate() {
        assert_eq!(clamp_target_rate(-5), 1);
        assert_eq!(clamp_target_rate(0), 1);
        assert_eq!(clamp_target_rate(1), 1);
        assert_eq!(clamp_target_rate(144), 144);
        assert_eq!(clamp_target_rate(65_535), 65_535);
        assert_eq!(clamp_target_rate(70_000), 65_535);
        assert_eq!(clamp_target_rate(i64::MAX), 65_535);
    }

    #[test]
    fn test_frame_budget() {
        assert_eq!(frame_budget(1), Duration::from_secs(1));
        assert_eq!(frame_budget(1000), Duration::from_millis(1));
        assert_eq!(frame_budget(0), Duration::from_secs(1));
        assert_eq!(
            LoopConfig::new().with_target_rate(50).frame_budget(),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn test_budget_tracks_latest_rate() {
        let config = LoopConfig::new().with_target_rate(10).with_target_rate(100);
        assert_eq!(config.target_rate, 100);
        assert_eq!(config.frame_budget(), Duration::from_millis(10));
    }

    #[test]
    fn test_normalize() {
        let mut config = LoopConfig {
            target_rate: 0,
            pacing: PacingStrategy::SleepAndSpin {
                spin_threshold_us: 5_000_000,
            },
            dispatch: DispatchMode::Offloaded { clock_tick_ms: 0 },
            ..LoopConfig::default()
        };
        assert!(!config.is_valid());

        config.normalize();

        assert_eq!(config.target_rate, 1);
        assert_eq!(
            config.pacing,
            PacingStrategy::SleepAndSpin {
                spin_threshold_us: 1_000_000
            }
        );
        assert_eq!(config.dispatch, DispatchMode::Offloaded { clock_tick_ms: 1 });
        assert!(config.is_valid());
    }

    #[test]
    fn test_normalize_caps_spin_tail_at_budget() {
        let mut config = LoopConfig::new()
            .with_target_rate(100)
            .with_pacing(PacingStrategy::SleepAndSpin {
                spin_threshold_us: 50_000,
            });

        config.normalize();

        assert_eq!(
            config.pacing,
            PacingStrategy::SleepAndSpin {
                spin_threshold_us: 10_000
            }
        );
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() -> Result<(), serde_json::Error> {
        let config: LoopConfig = serde_json::from_str(r#"{"target_rate": 30}"#)?;
        assert_eq!(config.target_rate, 30);
        assert_eq!(config.dispatch, DispatchMode::Inline);
        Ok(())
    }

    #[test]
    fn test_serde_tagged_variants() -> Result<(), serde_json::Error> {
        let config = LoopConfig::new()
            .with_pacing(PacingStrategy::SleepAndSpin {
                spin_threshold_us: 200,
            })
            .with_dispatch(DispatchMode::offloaded());
        let json = serde_json::to_string(&config)?;
        assert!(json.contains(r#""kind":"sleep_and_spin""#));
        assert!(json.contains(r#""kind":"offloaded""#));

        let parsed: LoopConfig = serde_json::from_str(&json)?;
        assert_eq!(parsed, config);
        Ok(())
    }
}
