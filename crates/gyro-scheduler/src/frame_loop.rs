//! The frame loop: configuration, callbacks and lifecycle control.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::callbacks::CallbackSet;
use crate::config::{DispatchMode, LoopConfig, PacingStrategy};
use crate::dispatch::run_offloaded;
use crate::error::{LoopError, LoopResult};
use crate::fault::{FaultHandler, PhaseFault};
use crate::handle::{LoopHandle, LoopShared};
use crate::lifecycle::RunState;
use crate::scheduler::FrameScheduler;
use crate::stats::LoopStats;

/// Fixed-rate frame loop driving input, update and render callbacks.
///
/// Callbacks and configuration are supplied through consuming `with_*`
/// builders and stay fixed for every run. [`start`](Self::start) blocks
/// the calling thread; use [`handle`](Self::handle) to control the loop
/// from elsewhere.
///
/// # Example
///
/// ```
/// use gyro_scheduler::FrameLoop;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let frames = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&frames);
///
/// let frame_loop = FrameLoop::new()
///     .with_target_rate(120)
///     .with_update(move |_dt| {
///         counter.fetch_add(1, Ordering::Relaxed);
///     });
///
/// let handle = frame_loop.handle();
/// let stopper = std::thread::spawn(move || {
///     std::thread::sleep(std::time::Duration::from_millis(50));
///     handle.stop();
/// });
///
/// frame_loop.start()?;
/// assert!(frames.load(Ordering::Relaxed) > 0);
/// # stopper.join().ok();
/// # Ok::<(), gyro_scheduler::LoopError>(())
/// ```
pub struct FrameLoop {
    config: LoopConfig,
    callbacks: Mutex<CallbackSet>,
    has_update: bool,
    fault_handler: Option<FaultHandler>,
    shared: Arc<LoopShared>,
}

impl FrameLoop {
    /// Create a loop with the default configuration and no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(LoopConfig::default())
    }

    /// Create a loop from a configuration. The configuration is normalized.
    #[must_use]
    pub fn from_config(mut config: LoopConfig) -> Self {
        config.normalize();
        let shared = Arc::new(LoopShared::new(&config));
        Self {
            config,
            callbacks: Mutex::new(CallbackSet::new()),
            has_update: false,
            fault_handler: None,
            shared,
        }
    }

    /// Replace the whole configuration, keeping registered callbacks.
    #[must_use]
    pub fn with_config(mut self, mut config: LoopConfig) -> Self {
        config.normalize();
        self.shared.store_target_rate(config.target_rate);
        self.shared.set_safe_mode(config.safe_mode);
        self.config = config;
        self
    }

    /// Set the target rate in passes per second, clamped to `1..=65535`.
    #[must_use]
    pub fn with_target_rate(mut self, rate: i64) -> Self {
        self.config = self.config.with_target_rate(rate);
        self.shared.store_target_rate(self.config.target_rate);
        self
    }

    /// Emit the current rate on every pass.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Reject runtime target rate changes while running.
    #[must_use]
    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.config.safe_mode = safe_mode;
        self.shared.set_safe_mode(safe_mode);
        self
    }

    /// Set how the remainder of each frame budget is waited out.
    #[must_use]
    pub fn with_pacing(mut self, pacing: PacingStrategy) -> Self {
        self.config = self.config.with_pacing(pacing);
        self.config.normalize();
        self
    }

    /// Set where passes execute.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.config = self.config.with_dispatch(dispatch);
        self.config.normalize();
        self
    }

    /// Register the input-sampling callback.
    #[must_use]
    pub fn with_input<F>(mut self, input: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.callbacks.get_mut().set_input(Box::new(input));
        self
    }

    /// Register the update callback. Required before [`start`](Self::start).
    ///
    /// The callback receives the time elapsed since the previous pass
    /// completed (since the start of the run, for the first pass).
    #[must_use]
    pub fn with_update<F>(mut self, update: F) -> Self
    where
        F: FnMut(Duration) + Send + 'static,
    {
        self.callbacks.get_mut().set_update(Box::new(update));
        self.has_update = true;
        self
    }

    /// Register the render callback.
    #[must_use]
    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.callbacks.get_mut().set_render(Box::new(render));
        self
    }

    /// Register a handler for panics raised by phase callbacks.
    ///
    /// With a handler, a faulting run ends, the handler receives the fault
    /// and `start` returns `Ok(())`.
    #[must_use]
    pub fn with_fault_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(PhaseFault) + Send + Sync + 'static,
    {
        self.fault_handler = Some(Box::new(handler));
        self
    }

    /// Run the loop on the calling thread until stopped.
    ///
    /// Returns immediately with `Ok(())` if a run is already active. A loop
    /// that has been stopped may be started again; each run begins with a
    /// fresh rate window and delta baseline.
    ///
    /// # Errors
    ///
    /// - [`LoopError::MissingUpdateCallback`] if no update callback was
    ///   registered; no phase is invoked.
    /// - [`LoopError::PhaseFault`] if a phase panicked and no fault handler
    ///   is registered.
    /// - [`LoopError::WorkerSpawn`] if offloaded dispatch could not start
    ///   its worker thread.
    pub fn start(&self) -> LoopResult {
        if !self.has_update {
            return Err(LoopError::MissingUpdateCallback);
        }

        let Some(token) = self.shared.lifecycle.try_begin() else {
            debug!("Start requested while already running; ignoring");
            return Ok(());
        };

        // Held for the whole run; a restart waits here for a stopped run to drain
        let mut callbacks = self.callbacks.lock();
        if !self.shared.lifecycle.is_current(token) {
            return Ok(());
        }

        self.shared.publish_rate(0);
        self.shared.counters.inc_run();
        info!(
            target_rate = self.shared.target_rate(),
            dispatch = ?self.config.dispatch,
            pacing = ?self.config.pacing,
            safe_mode = self.config.safe_mode,
            "Frame loop started"
        );

        let scheduler = FrameScheduler::new(&self.shared, &self.config, token);
        let outcome = match self.config.dispatch {
            DispatchMode::Inline => scheduler.run_inline(&mut callbacks).map_err(LoopError::from),
            DispatchMode::Offloaded { clock_tick_ms } => run_offloaded(
                scheduler,
                &mut callbacks,
                Duration::from_millis(clock_tick_ms),
            ),
        };
        drop(callbacks);

        self.shared.lifecycle.finish(token);

        match outcome {
            Ok(()) => {
                info!(
                    total_passes = self.shared.counters.snapshot().total_passes,
                    "Frame loop stopped"
                );
                Ok(())
            }
            Err(LoopError::PhaseFault(fault)) => {
                self.shared.counters.inc_fault();
                warn!(
                    phase = %fault.phase(),
                    pass = fault.pass(),
                    message = fault.message(),
                    "Frame loop terminated by phase fault"
                );
                match &self.fault_handler {
                    Some(handler) => {
                        handler(fault);
                        Ok(())
                    }
                    None => Err(LoopError::PhaseFault(fault)),
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Request the loop to stop. Idempotent; does not wait for the
    /// in-flight pass.
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

    /// Change the target rate at runtime; applied from the next pass.
    ///
    /// Clamped to `1..=65535`. Returns `false` when the change was
    /// rejected because the loop is running in safe mode.
    pub fn set_target_rate(&self, rate: i64) -> bool {
        self.shared.set_target_rate(rate)
    }

    /// Rate published by the last completed one-second window, 0 before
    /// the first window of the current run completes.
    #[must_use]
    pub fn current_rate(&self) -> u16 {
        self.shared.current_rate()
    }

    /// Snapshot of the pass counters across all runs.
    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.shared.counters.snapshot()
    }

    /// Current configuration, including any runtime target rate change.
    #[must_use]
    pub fn config(&self) -> LoopConfig {
        LoopConfig {
            target_rate: self.shared.target_rate(),
            ..self.config.clone()
        }
    }

    /// Cloneable handle for controlling the loop from other threads.
    #[must_use]
    pub fn handle(&self) -> LoopHandle {
        LoopHandle::new(Arc::clone(&self.shared))
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLoop")
            .field("config", &self.config())
            .field("has_update", &self.has_update)
            .field("has_fault_handler", &self.fault_handler.is_some())
            .field("state", &self.run_state())
            .finish_non_exhaustive()
    }
}
