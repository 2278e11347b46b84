//! gyro - Frame Loop CLI
//!
//! Runs synthetic fixed-rate frame loops and reports the achieved rate, and
//! prints the effective loop configuration resolved from files and flags.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::LoopArgs;
use crate::commands::run::RunArgs;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "gyro")]
#[command(about = "Frame Loop CLI - Run fixed-rate loops and measure their achieved rate")]
#[command(version)]
#[command(long_about = "
gyro drives a fixed-rate input/update/render loop with simulated work and
reports the rate it actually achieved, along with overruns and dropped
clock ticks.

Loop settings can come from a JSON or YAML file and be overridden by flags.
Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic frame loop and report its rate
    Run(RunArgs),

    /// Print the effective, normalized loop configuration
    Config(LoopArgs),
}

impl Cli {
    /// Log level from `-v` count; `--debug` raises it to at least info so
    /// per-pass rate lines are visible.
    fn log_level(&self) -> &'static str {
        let debug_flag = match &self.command {
            Commands::Run(args) => args.loop_args.debug,
            Commands::Config(args) => args.debug,
        };

        match (self.verbose, debug_flag) {
            (0, false) => "warn",
            (0, true) | (1, _) => "info",
            (2, _) => "debug",
            _ => "trace",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("gyro={log_level},gyro_scheduler={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let result = execute_command(&cli);

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.json),
        Commands::Config(args) => commands::config::execute(args, cli.json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::PacingKind;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["gyro", "run"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        let Commands::Run(args) = cli.command else {
            return Err("expected run command".into());
        };
        assert_eq!(args.work_ms, 0);
        assert!(args.loop_args.rate.is_none());
        assert!(!args.loop_args.offload);
        Ok(())
    }

    #[test]
    fn parse_run_with_all_flags() -> TestResult {
        let cli = Cli::try_parse_from([
            "gyro",
            "--json",
            "run",
            "--rate",
            "144",
            "--duration",
            "0.5",
            "--work-ms",
            "2",
            "--pacing",
            "spin",
            "--spin-threshold-us",
            "300",
            "--offload",
            "--clock-tick-ms",
            "5",
            "--safe-mode",
            "--debug",
        ])?;
        assert!(cli.json);
        let Commands::Run(args) = cli.command else {
            return Err("expected run command".into());
        };
        assert_eq!(args.loop_args.rate, Some(144));
        assert_eq!(args.loop_args.pacing, Some(PacingKind::Spin));
        assert_eq!(args.loop_args.spin_threshold_us, Some(300));
        assert_eq!(args.loop_args.clock_tick_ms, Some(5));
        assert!(args.loop_args.offload && args.loop_args.safe_mode && args.loop_args.debug);
        assert_eq!(args.work_ms, 2);
        Ok(())
    }

    #[test]
    fn parse_negative_rate() -> TestResult {
        let cli = Cli::try_parse_from(["gyro", "config", "--rate", "-5"])?;
        let Commands::Config(args) = cli.command else {
            return Err("expected config command".into());
        };
        assert_eq!(args.rate, Some(-5));
        Ok(())
    }

    #[test]
    fn global_flags_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from(["gyro", "config", "--json", "-vv"])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        Ok(())
    }

    #[test]
    fn debug_flag_raises_log_level() -> TestResult {
        let quiet = Cli::try_parse_from(["gyro", "run"])?;
        assert_eq!(quiet.log_level(), "warn");

        let debug = Cli::try_parse_from(["gyro", "run", "--debug"])?;
        assert_eq!(debug.log_level(), "info");

        let verbose = Cli::try_parse_from(["gyro", "-vvv", "run", "--debug"])?;
        assert_eq!(verbose.log_level(), "trace");
        Ok(())
    }

    #[test]
    fn invalid_pacing_is_rejected() {
        let parsed = Cli::try_parse_from(["gyro", "run", "--pacing", "yield"]);
        assert!(matches!(parsed, Err(_)));
    }
}
