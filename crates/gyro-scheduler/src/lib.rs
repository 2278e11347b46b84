//! Fixed-rate frame loop with phase callbacks and rate measurement.
//!
//! This crate drives a three-phase pass (input, update, render) at a
//! configured target rate, measuring the achieved rate once per second.
//! It includes:
//!
//! - **FrameLoop**: builder-style loop with a blocking `start` and restartable lifecycle
//! - **LoopHandle**: cloneable, lock-free control and metrics from other threads
//! - **RateMeter**: one-second windows normalized to passes per second
//! - **PacingStrategy**: sleep, or sleep with a busy-spin tail
//! - **DispatchMode**: inline passes, or passes offloaded to a worker on a clock tick
//! - **PhaseFault**: panics in callbacks contained and reported per phase
//!
//! # Timing Model
//!
//! - Each pass gets a budget of one second divided by the target rate
//! - A pass that finishes early waits out the remainder of its budget
//! - An overrunning pass is followed immediately by the next; missed time is never caught up
//! - The update callback receives the time since the previous pass completed
//!
//! # Example
//!
//! ```no_run
//! use gyro_scheduler::{FrameLoop, PacingStrategy};
//!
//! let frame_loop = FrameLoop::new()
//!     .with_target_rate(60)
//!     .with_pacing(PacingStrategy::SleepAndSpin { spin_threshold_us: 500 })
//!     .with_input(|| { /* poll devices */ })
//!     .with_update(|dt| { let _seconds = dt.as_secs_f64(); })
//!     .with_render(|| { /* draw */ });
//!
//! frame_loop.start().expect("update callback is registered");
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod callbacks;
pub mod config;
mod dispatch;
pub mod error;
pub mod fault;
pub mod frame_loop;
pub mod handle;
pub mod lifecycle;
pub mod pacing;
pub mod rate;
mod scheduler;
pub mod stats;

pub mod prelude;

pub use callbacks::{CallbackSet, InputFn, RenderFn, UpdateFn};
pub use config::{
    DEFAULT_CLOCK_TICK_MS, DEFAULT_TARGET_RATE, DispatchMode, LoopConfig, MAX_TARGET_RATE,
    MIN_TARGET_RATE, PacingStrategy, clamp_target_rate, frame_budget,
};
pub use error::{LoopError, LoopResult};
pub use fault::{FaultHandler, Phase, PhaseFault};
pub use frame_loop::FrameLoop;
pub use handle::LoopHandle;
pub use lifecycle::RunState;
pub use rate::{RATE_WINDOW, RateMeter, normalized_rate};
pub use stats::{LoopCounters, LoopStats};
