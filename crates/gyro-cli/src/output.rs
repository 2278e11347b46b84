//! Output formatting for CLI responses

use anyhow::Error;
use colored::Colorize;
use gyro_scheduler::{DispatchMode, LoopConfig, PacingStrategy};
use serde::Serialize;
use serde_json::json;

use crate::error::CliError;

/// Summary of a completed `gyro run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub config: LoopConfig,
    pub elapsed_secs: f64,
    pub passes: u64,
    pub measured_rate: u16,
    pub average_rate: f64,
    pub overrun_passes: u64,
    pub skipped_ticks: u64,
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let kind = error
        .downcast_ref::<CliError>()
        .map_or("internal", CliError::kind);
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": kind
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Print the effective configuration
pub fn print_config(config: &LoopConfig, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "config": config
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format configuration as JSON: {e}"),
        }
        return;
    }

    println!("{}", "Frame Loop Configuration:".bold());
    print_config_lines(config);
}

/// Print a run summary
pub fn print_run_report(report: &RunReport, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "run": report
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format run report as JSON: {e}"),
        }
        return;
    }

    println!("{}", "Frame Loop Run:".bold());
    print_config_lines(&report.config);
    println!("  Elapsed: {:.2} s", report.elapsed_secs);
    println!("  Passes: {}", report.passes);
    println!(
        "  Measured rate: {} fps",
        rate_colored(report.measured_rate, report.config.target_rate)
    );
    println!("  Average rate: {:.1} fps", report.average_rate);

    let overruns = report.overrun_passes.to_string();
    if report.overrun_passes > 0 {
        println!("  Overruns: {}", overruns.yellow());
    } else {
        println!("  Overruns: {}", overruns.green());
    }

    if matches!(report.config.dispatch, DispatchMode::Offloaded { .. }) {
        println!("  Skipped ticks: {}", report.skipped_ticks);
    }
}

fn print_config_lines(config: &LoopConfig) {
    println!("  Target rate: {} fps", config.target_rate);
    println!("  Frame budget: {:?}", config.frame_budget());
    println!("  Pacing: {}", format_pacing(config.pacing));
    println!("  Dispatch: {}", format_dispatch(config.dispatch));
    println!("  Safe mode: {}", on_off(config.safe_mode));
    println!("  Debug: {}", on_off(config.debug));
}

fn format_pacing(pacing: PacingStrategy) -> String {
    match pacing {
        PacingStrategy::Sleep => "sleep".to_string(),
        PacingStrategy::SleepAndSpin { spin_threshold_us } => {
            format!("sleep + spin ({spin_threshold_us} µs tail)")
        }
    }
}

fn format_dispatch(dispatch: DispatchMode) -> String {
    match dispatch {
        DispatchMode::Inline => "inline".to_string(),
        DispatchMode::Offloaded { clock_tick_ms } => {
            format!("offloaded ({clock_tick_ms} ms clock tick)")
        }
    }
}

fn on_off(enabled: bool) -> String {
    if enabled {
        "on".green().to_string()
    } else {
        "off".dimmed().to_string()
    }
}

/// Color the measured rate by how close it came to the target.
fn rate_colored(measured: u16, target: u16) -> String {
    let text = measured.to_string();
    let shortfall = target.saturating_sub(measured);
    if measured == 0 {
        text.dimmed().to_string()
    } else if u32::from(shortfall) * 10 <= u32::from(target) {
        text.green().to_string()
    } else {
        text.yellow().to_string()
    }
}
