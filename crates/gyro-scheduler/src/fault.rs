//! Faults raised by phase callbacks while the loop is running.
//!
//! Every phase invocation runs inside an unwind boundary. A panic is turned
//! into a [`PhaseFault`] that records which phase failed, on which pass, and
//! the original panic payload, so it can be handed to the registered
//! [`FaultHandler`] or returned from `start`.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

/// Handler invoked with the fault that ended a run.
pub type FaultHandler = Box<dyn Fn(PhaseFault) + Send + Sync>;

/// One of the three callback phases of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Input sampling, runs first.
    Input,
    /// State update, receives the delta time.
    Update,
    /// Rendering, runs last.
    Render,
}

impl Phase {
    /// Stable lowercase name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Update => "update",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A panic caught from a phase callback.
pub struct PhaseFault {
    phase: Phase,
    pass: u64,
    message: String,
    payload: Option<Box<dyn Any + Send>>,
}

impl PhaseFault {
    /// Create a fault without a panic payload.
    #[must_use]
    pub fn new(phase: Phase, pass: u64, message: impl Into<String>) -> Self {
        Self {
            phase,
            pass,
            message: message.into(),
            payload: None,
        }
    }

    pub(crate) fn from_panic(phase: Phase, pass: u64, payload: Box<dyn Any + Send>) -> Self {
        Self {
            phase,
            pass,
            message: panic_message(&*payload),
            payload: Some(payload),
        }
    }

    /// Phase whose callback panicked.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 1-based number of the pass (within its run) that faulted.
    #[must_use]
    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// Panic message, or a placeholder for non-string payloads.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Take the original panic payload, e.g. to resume unwinding.
    pub fn take_payload(&mut self) -> Option<Box<dyn Any + Send>> {
        self.payload.take()
    }
}

impl fmt::Debug for PhaseFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseFault")
            .field("phase", &self.phase)
            .field("pass", &self.pass)
            .field("message", &self.message)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

impl fmt::Display for PhaseFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} phase panicked on pass {}: {}",
            self.phase, self.pass, self.message
        )
    }
}

impl std::error::Error for PhaseFault {}

/// Run `f` inside an unwind boundary, mapping a panic to a [`PhaseFault`].
pub(crate) fn guarded<F: FnOnce()>(phase: Phase, pass: u64, f: F) -> Result<(), PhaseFault> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| PhaseFault::from_panic(phase, pass, payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
