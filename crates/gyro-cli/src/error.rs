//! Error types for the gyro CLI

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Frame loop failed: {0}")]
    LoopFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl CliError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ValidationError(_)
            | Self::InvalidConfiguration(_)
            | Self::JsonError(_)
            | Self::YamlError(_) => 4,
            Self::LoopFailed(_) | Self::IoError(_) => 1,
        }
    }

    /// Short machine-readable name used in JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "validation",
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::LoopFailed(_) => "loop_failed",
            Self::IoError(_) => "io",
            Self::JsonError(_) => "json",
            Self::YamlError(_) => "yaml",
        }
    }
}

impl From<gyro_scheduler::LoopError> for CliError {
    fn from(err: gyro_scheduler::LoopError) -> Self {
        // Phase faults carry a non-Sync panic payload; keep the rendered message only
        Self::LoopFailed(err.to_string())
    }
}
