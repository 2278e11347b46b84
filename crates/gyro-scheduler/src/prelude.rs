//! Prelude module for common frame loop types.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the frame loop crate.

pub use crate::config::{DispatchMode, LoopConfig, PacingStrategy};
pub use crate::error::{LoopError, LoopResult};
pub use crate::fault::{Phase, PhaseFault};
pub use crate::frame_loop::FrameLoop;
pub use crate::handle::LoopHandle;
pub use crate::lifecycle::RunState;
pub use crate::stats::LoopStats;
pub use crate::{DEFAULT_TARGET_RATE, RATE_WINDOW};
