//! Phase callbacks driven by the scheduler.

use std::fmt;
use std::time::{Duration, Instant};

use crate::fault::{Phase, PhaseFault, guarded};

/// Input-sampling callback.
pub type InputFn = Box<dyn FnMut() + Send>;

/// State-update callback; receives the time since the previous pass completed.
pub type UpdateFn = Box<dyn FnMut(Duration) + Send>;

/// Rendering callback.
pub type RenderFn = Box<dyn FnMut() + Send>;

/// The three independently optional phase callbacks.
#[derive(Default)]
pub struct CallbackSet {
    input: Option<InputFn>,
    update: Option<UpdateFn>,
    render: Option<RenderFn>,
}

impl CallbackSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_input(&mut self, input: InputFn) {
        self.input = Some(input);
    }

    pub(crate) fn set_update(&mut self, update: UpdateFn) {
        self.update = Some(update);
    }

    pub(crate) fn set_render(&mut self, render: RenderFn) {
        self.render = Some(render);
    }

    /// Run one pass: input, then update, then render.
    ///
    /// `pass` is the 1-based pass number used to tag a fault. The update
    /// callback receives the time elapsed since `last_completion`, measured
    /// right before it is invoked. The first panicking phase ends the pass.
    pub(crate) fn run_pass(&mut self, pass: u64, last_completion: Instant) -> Result<(), PhaseFault> {
        if let Some(input) = self.input.as_mut() {
            guarded(Phase::Input, pass, input)?;
        }

        if let Some(update) = self.update.as_mut() {
            let delta = last_completion.elapsed();
            guarded(Phase::Update, pass, || update(delta))?;
        }

        if let Some(render) = self.render.as_mut() {
            guarded(Phase::Render, pass, render)?;
        }

        Ok(())
    }
}

impl fmt::Debug for CallbackSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSet")
            .field("input", &self.input.is_some())
            .field("update", &self.update.is_some())
            .field("render", &self.render.is_some())
            .finish()
    }
}

#[cfg(test)]
#[expect(clippy::panic, reason = "tests inject panics into phase callbacks")]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn recording_set(log: &Arc<Mutex<Vec<&'static str>>>) -> CallbackSet {
        let mut set = CallbackSet::new();
        let input_log = Arc::clone(log);
        set.set_input(Box::new(move || input_log.lock().push("input")));
        let update_log = Arc::clone(log);
        set.set_update(Box::new(move |_: Duration| update_log.lock().push("update")));
        let render_log = Arc::clone(log);
        set.set_render(Box::new(move || render_log.lock().push("render")));
        set
    }

    #[test]
    fn test_phases_run_in_order() -> TestResult {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut set = recording_set(&log);

        set.run_pass(1, Instant::now())?;
        set.run_pass(2, Instant::now())?;

        assert_eq!(
            *log.lock(),
            vec!["input", "update", "render", "input", "update", "render"]
        );
        Ok(())
    }

    #[test]
    fn test_missing_phases_are_skipped() -> TestResult {
        let calls = Arc::new(Mutex::new(0u32));
        let mut set = CallbackSet::new();
        let counter = Arc::clone(&calls);
        set.set_update(Box::new(move |_: Duration| *counter.lock() += 1));

        set.run_pass(1, Instant::now())?;

        assert_eq!(*calls.lock(), 1);
        Ok(())
    }

    #[test]
    fn test_update_receives_elapsed_since_completion() -> TestResult {
        let seen = Arc::new(Mutex::new(Duration::ZERO));
        let mut set = CallbackSet::new();
        let slot = Arc::clone(&seen);
        set.set_update(Box::new(move |dt: Duration| *slot.lock() = dt));

        let last_completion = Instant::now()
            .checked_sub(Duration::from_millis(40))
            .ok_or("monotonic clock too close to its origin")?;
        set.run_pass(1, last_completion)?;

        assert!(*seen.lock() >= Duration::from_millis(40));
        Ok(())
    }

    #[test]
    fn test_fault_stops_remaining_phases() -> TestResult {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut set = recording_set(&log);
        set.set_update(Box::new(|_: Duration| panic!("physics diverged")));

        let fault = set
            .run_pass(4, Instant::now())
            .err()
            .ok_or("update panic must surface as a fault")?;

        assert_eq!(fault.phase(), Phase::Update);
        assert_eq!(fault.pass(), 4);
        assert_eq!(fault.message(), "physics diverged");
        assert_eq!(*log.lock(), vec!["input"]);
        Ok(())
    }

    #[test]
    fn test_debug_lists_registered_phases() {
        let mut set = CallbackSet::new();
        set.set_render(Box::new(|| {}));
        let debug = format!("{set:?}");
        assert!(debug.contains("render: true"));
        assert!(debug.contains("update: false"));
    }
}
