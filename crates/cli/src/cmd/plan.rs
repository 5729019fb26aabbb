//! Implementation of the `distrobuild plan` command.
//!
//! Prints what `build` would do for each target without downloading repositories,
//! extracting images or running the installer.

use std::path::Path;

use anyhow::{Context, Result};

use distrobuild_lib::plan_distros;

use crate::output::{OutputFormat, write_json, write_no_targets, write_plan};

pub fn cmd_plan(config_path: &Path, format: OutputFormat) -> Result<()> {
  let config = super::load_config(config_path)?;
  let plan = plan_distros(&config).context("Failed to plan builds")?;

  let mut stdout = std::io::stdout().lock();
  if format.is_json() {
    return write_json(&mut stdout, &plan);
  }

  if plan.targets.is_empty() {
    write_no_targets(&mut stdout, &config.target_dir)?;
    return Ok(());
  }

  write_plan(&mut stdout, &plan)?;
  Ok(())
}
