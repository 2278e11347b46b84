//! Effective configuration display

use anyhow::Result;

use crate::commands::LoopArgs;
use crate::output;

/// Resolve and print the configuration a `run` with the same flags would use
pub fn execute(args: &LoopArgs, json: bool) -> Result<()> {
    let config = args.resolve()?;
    output::print_config(&config, json);
    Ok(())
}
