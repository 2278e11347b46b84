//! Command implementations for the gyro CLI

pub mod config;
pub mod run;

use clap::{Args, ValueEnum};
use gyro_scheduler::{DEFAULT_CLOCK_TICK_MS, DispatchMode, LoopConfig, PacingStrategy};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CliError;

/// Spin tail used by `--pacing spin` when no threshold is given.
pub const DEFAULT_SPIN_THRESHOLD_US: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PacingKind {
    /// Sleep for the remaining budget
    Sleep,
    /// Sleep, then busy-spin the final stretch
    Spin,
}

/// Loop configuration flags shared by `run` and `config`.
///
/// Flags override values loaded from `--config`.
#[derive(Debug, Clone, Default, Args)]
pub struct LoopArgs {
    /// Configuration file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long, env = "GYRO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target passes per second (clamped to 1..=65535)
    #[arg(short, long, allow_negative_numbers = true)]
    pub rate: Option<i64>,

    /// Pacing wait strategy
    #[arg(long, value_enum)]
    pub pacing: Option<PacingKind>,

    /// Busy-spin tail for spin pacing, in microseconds
    #[arg(long)]
    pub spin_threshold_us: Option<u64>,

    /// Run phases on a worker thread driven by a clock tick
    #[arg(long)]
    pub offload: bool,

    /// Clock tick for offloaded dispatch, in milliseconds
    #[arg(long)]
    pub clock_tick_ms: Option<u64>,

    /// Reject runtime rate changes while running
    #[arg(long)]
    pub safe_mode: bool,

    /// Log the current rate on every pass
    #[arg(long)]
    pub debug: bool,
}

impl LoopArgs {
    /// Build the effective, normalized configuration.
    pub fn resolve(&self) -> Result<LoopConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => LoopConfig::default(),
        };

        if let Some(rate) = self.rate {
            config = config.with_target_rate(rate);
        }

        match (self.pacing, self.spin_threshold_us) {
            (Some(PacingKind::Sleep), Some(_)) => {
                return Err(CliError::ValidationError(
                    "--spin-threshold-us requires --pacing spin".to_string(),
                ));
            }
            (Some(PacingKind::Sleep), None) => config.pacing = PacingStrategy::Sleep,
            (Some(PacingKind::Spin), threshold) => {
                config.pacing = PacingStrategy::SleepAndSpin {
                    spin_threshold_us: threshold.unwrap_or(DEFAULT_SPIN_THRESHOLD_US),
                };
            }
            (None, Some(spin_threshold_us)) => {
                config.pacing = PacingStrategy::SleepAndSpin { spin_threshold_us };
            }
            (None, None) => {}
        }

        if self.offload || self.clock_tick_ms.is_some() {
            let clock_tick_ms = match (self.clock_tick_ms, config.dispatch) {
                (Some(tick), _) => tick,
                (None, DispatchMode::Offloaded { clock_tick_ms }) => clock_tick_ms,
                (None, DispatchMode::Inline) => DEFAULT_CLOCK_TICK_MS,
            };
            config.dispatch = DispatchMode::Offloaded { clock_tick_ms };
        }

        config.safe_mode |= self.safe_mode;
        config.debug |= self.debug;
        config.normalize();
        Ok(config)
    }
}

/// Load a configuration file, picking the format from its extension.
pub fn load_config(path: &Path) -> Result<LoopConfig, CliError> {
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let config = match extension.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
        Some("json") | None => serde_json::from_str(&content)?,
        Some(other) => {
            return Err(CliError::InvalidConfiguration(format!(
                "unsupported config format '.{other}' (expected .json, .yaml or .yml)"
            )));
        }
    };
    Ok(config)
}
