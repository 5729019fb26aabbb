//! Implementation of the `distrobuild build` command.
//!
//! Loads the configuration, applies command-line overrides and builds every target.
//! Targets whose installer run fails are listed but do not fail the command; fatal
//! errors (missing installer, repository download, unreadable base image, Ctrl-C) do.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use distrobuild_lib::build_distros;

use crate::output::{write_no_targets, write_report};

pub fn cmd_build(config_path: &Path, jobs: Option<usize>, installer: Option<PathBuf>) -> Result<()> {
  let mut config = super::load_config(config_path)?;

  if let Some(jobs) = jobs {
    anyhow::ensure!(jobs > 0, "--jobs must be at least 1");
    config.jobs = jobs;
  }
  if let Some(installer) = installer {
    config.installer = Some(installer);
  }
  debug!(?config, "loaded configuration");

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(build_distros(&config)).context("Build failed")?;

  let (stdout, stderr) = (std::io::stdout(), std::io::stderr());
  if report.total() == 0 {
    write_no_targets(&mut stdout.lock(), &config.target_dir)?;
    return Ok(());
  }

  write_report(&mut stdout.lock(), &mut stderr.lock(), &report, started.elapsed())?;
  Ok(())
}
