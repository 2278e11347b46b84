//! Synthetic frame loop runs

use anyhow::Result;
use clap::Args;
use gyro_scheduler::FrameLoop;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::commands::LoopArgs;
use crate::error::CliError;
use crate::output::{self, RunReport};

const STOP_RETRY_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub loop_args: LoopArgs,

    /// How long to run, in seconds
    #[arg(short, long, default_value_t = 3.0)]
    pub duration: f64,

    /// Simulated work per update, in milliseconds
    #[arg(short, long, default_value_t = 0)]
    pub work_ms: u64,
}

impl RunArgs {
    fn run_duration(&self) -> Result<Duration, CliError> {
        match Duration::try_from_secs_f64(self.duration) {
            Ok(duration) if !duration.is_zero() => Ok(duration),
            _ => Err(CliError::ValidationError(format!(
                "--duration must be a positive number of seconds, got {}",
                self.duration
            ))),
        }
    }
}

/// Run a synthetic loop for the requested duration and report its rate
pub fn execute(args: &RunArgs, json: bool) -> Result<()> {
    let config = args.loop_args.resolve()?;
    let duration = args.run_duration()?;
    let work = Duration::from_millis(args.work_ms);

    let frame_loop = FrameLoop::from_config(config).with_update(move |_dt| {
        if !work.is_zero() {
            thread::sleep(work);
        }
    });

    let handle = frame_loop.handle();
    let finished = Arc::new(AtomicBool::new(false));
    let timer_finished = Arc::clone(&finished);
    let timer = thread::Builder::new()
        .name("gyro-run-timer".to_string())
        .spawn(move || {
            thread::sleep(duration);
            // Repeat until the run ends, in case the deadline beat `start`
            while !timer_finished.load(Ordering::Acquire) {
                handle.stop();
                thread::sleep(STOP_RETRY_INTERVAL);
            }
        })
        .map_err(CliError::IoError)?;

    info!(?duration, work_ms = args.work_ms, "Starting synthetic frame loop");
    let started = Instant::now();
    let outcome = frame_loop.start();
    let elapsed = started.elapsed();
    finished.store(true, Ordering::Release);
    outcome.map_err(CliError::from)?;

    if timer.join().is_err() {
        debug!("Run timer thread panicked");
    }

    let stats = frame_loop.stats();
    let report = RunReport {
        config: frame_loop.config(),
        elapsed_secs: elapsed.as_secs_f64(),
        passes: stats.total_passes,
        measured_rate: frame_loop.current_rate(),
        average_rate: average_rate(stats.total_passes, elapsed),
        overrun_passes: stats.overrun_passes,
        skipped_ticks: stats.skipped_ticks,
    };

    output::print_run_report(&report, json);
    Ok(())
}

/// Passes per second over the whole run.
fn average_rate(passes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    f64::from(u32::try_from(passes).unwrap_or(u32::MAX)) / secs
}
