//! Error types for the frame loop crate.

use thiserror::Error;

use crate::fault::PhaseFault;

/// Errors surfaced by [`FrameLoop::start`](crate::FrameLoop::start).
#[derive(Debug, Error)]
pub enum LoopError {
    /// `start` was called before an update callback was registered.
    #[error("Update callback must be registered before the loop can start")]
    MissingUpdateCallback,

    /// A phase callback panicked and no fault handler was registered.
    #[error("Frame loop terminated by phase fault: {0}")]
    PhaseFault(#[from] PhaseFault),

    /// The offloaded dispatch worker thread could not be spawned.
    #[error("Failed to spawn dispatch worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

impl LoopError {
    /// Returns the phase fault carried by this error, if any.
    #[must_use]
    pub fn phase_fault(&self) -> Option<&PhaseFault> {
        match self {
            Self::PhaseFault(fault) => Some(fault),
            Self::MissingUpdateCallback | Self::WorkerSpawn(_) => None,
        }
    }
}

/// Result type returned by loop control operations.
pub type LoopResult<T = ()> = Result<T, LoopError>;
