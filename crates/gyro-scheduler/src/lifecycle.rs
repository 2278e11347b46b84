//! Run-state tracking for a frame loop.
//!
//! The state and a run generation are packed into one atomic word. Every
//! successful start bumps the generation, so a run that is still finishing
//! its last pass after `stop` can never mistake a newer run for its own.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

const STATE_BITS: u32 = 2;
const STATE_MASK: u64 = 0b11;
const GENERATION_MASK: u64 = u64::MAX >> STATE_BITS;

/// Lifecycle state of a frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RunState {
    /// Never started.
    Idle = 0,
    /// A run is active.
    Running = 1,
    /// The last run has been stopped; the loop may be started again.
    Stopped = 2,
}

impl RunState {
    fn from_word(word: u64) -> Self {
        match word & STATE_MASK {
            1 => Self::Running,
            2 => Self::Stopped,
            _ => Self::Idle,
        }
    }

    fn bits(self) -> u64 {
        u64::from(self as u8)
    }
}

/// Identifies one run between a successful start and its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunToken {
    generation: u64,
}

fn pack(state: RunState, generation: u64) -> u64 {
    ((generation & GENERATION_MASK) << STATE_BITS) | state.bits()
}

fn generation_of(word: u64) -> u64 {
    word >> STATE_BITS
}

/// Atomic lifecycle word shared between the loop and its handles.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    word: AtomicU64,
}

impl Lifecycle {
    pub(crate) const fn new() -> Self {
        Self {
            word: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> RunState {
        RunState::from_word(self.word.load(Ordering::Acquire))
    }

    /// Move Idle/Stopped to Running under a fresh generation.
    ///
    /// Returns `None` when a run is already active.
    pub(crate) fn try_begin(&self) -> Option<RunToken> {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            if RunState::from_word(current) == RunState::Running {
                return None;
            }

            let generation = generation_of(current).wrapping_add(1) & GENERATION_MASK;
            let next = pack(RunState::Running, generation);
            match self
                .word
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Some(RunToken { generation }),
                Err(actual) => current = actual,
            }
        }
    }

    /// Move Running to Stopped. Returns `false` when nothing was running.
    pub(crate) fn request_stop(&self) -> bool {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            if RunState::from_word(current) != RunState::Running {
                return false;
            }

            let next = pack(RunState::Stopped, generation_of(current));
            match self
                .word
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Whether the run identified by `token` should keep going.
    #[inline]
    pub(crate) fn is_current(&self, token: RunToken) -> bool {
        self.word.load(Ordering::Acquire) == pack(RunState::Running, token.generation)
    }

    /// End the run identified by `token` if it is still the active one.
    pub(crate) fn finish(&self, token: RunToken) -> bool {
        self.word
            .compare_exchange(
                pack(RunState::Running, token.generation),
                pack(RunState::Stopped, token.generation),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}
