mod build;
mod plan;

pub use build::cmd_build;
pub use plan::cmd_plan;

use std::path::Path;

use anyhow::{Context, Result};

use distrobuild_lib::BuildConfig;

/// Load the configuration file, with a readable error if it is missing.
fn load_config(path: &Path) -> Result<BuildConfig> {
  if !path.exists() {
    anyhow::bail!("Config file not found: {}", path.display());
  }
  BuildConfig::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}
