//! Offloaded dispatch: passes run on a worker thread, gated by a clock tick.
//!
//! The scheduling thread wakes on a fixed tick. A tick is dropped while the
//! previous pass is still in flight, and ignored until one frame budget has
//! elapsed since the last dispatch. At most one pass is ever queued or
//! running, so phases never execute concurrently with each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, tick};
use parking_lot::Mutex;
use tracing::debug;

use crate::callbacks::CallbackSet;
use crate::error::{LoopError, LoopResult};
use crate::fault::PhaseFault;
use crate::rate::RateMeter;
use crate::scheduler::{FrameScheduler, remaining_budget};

const WORKER_THREAD_NAME: &str = "gyro-dispatch";

/// Run passes on a scoped worker until cancelled or a phase faults.
///
/// Returns after the worker has finished its in-flight pass and exited.
pub(crate) fn run_offloaded(
    scheduler: FrameScheduler<'_>,
    callbacks: &mut CallbackSet,
    clock_tick: Duration,
) -> LoopResult {
    let shared = scheduler.shared();
    let in_flight = AtomicBool::new(false);
    let faulted = AtomicBool::new(false);
    let fault_slot: Mutex<Option<PhaseFault>> = Mutex::new(None);
    let (job_tx, job_rx) = bounded::<u64>(1);
    let ticker = tick(clock_tick.max(Duration::from_millis(1)));

    thread::scope(|scope| -> LoopResult {
        let in_flight = &in_flight;
        let faulted = &faulted;
        let fault_slot = &fault_slot;

        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn_scoped(scope, move || {
                let worker_start = Instant::now();
                let mut meter = RateMeter::new(worker_start);
                let mut last_completion = worker_start;

                for pass in job_rx.iter() {
                    let pass_start = Instant::now();
                    scheduler.roll_rate(&mut meter, pass_start);

                    if let Err(fault) = callbacks.run_pass(pass, last_completion) {
                        *fault_slot.lock() = Some(fault);
                        faulted.store(true, Ordering::Release);
                        in_flight.store(false, Ordering::Release);
                        break;
                    }

                    last_completion = Instant::now();
                    scheduler.complete_pass(&mut meter, pass, pass_start, last_completion);
                    in_flight.store(false, Ordering::Release);
                }

                if !faulted.load(Ordering::Acquire) {
                    scheduler.roll_rate(&mut meter, Instant::now());
                }
                debug!("Dispatch worker exiting");
            })
            .map_err(LoopError::WorkerSpawn)?;

        let mut pass: u64 = 0;
        let mut last_dispatch: Option<Instant> = None;

        while scheduler.is_active() && !faulted.load(Ordering::Acquire) {
            if ticker.recv().is_err() {
                break;
            }

            if in_flight.load(Ordering::Acquire) {
                shared.counters.inc_skipped_tick();
                continue;
            }

            let now = Instant::now();
            if let Some(last) = last_dispatch
                && !remaining_budget(shared.frame_budget(), last, now).is_zero()
            {
                continue;
            }

            pass = pass.wrapping_add(1);
            in_flight.store(true, Ordering::Release);
            if job_tx.send(pass).is_err() {
                in_flight.store(false, Ordering::Release);
                break;
            }
            last_dispatch = Some(now);
        }

        // Closing the queue lets the worker drain and exit; the scope joins it
        drop(job_tx);
        Ok(())
    })?;

    match fault_slot.into_inner() {
        Some(fault) => Err(LoopError::PhaseFault(fault)),
        None => Ok(()),
    }
}
