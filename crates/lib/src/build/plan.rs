//! Dry-run planning: what a build would do, without downloading or running anything.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::command::{distribution_file_name, installer_args};
use super::select::{Selection, repository_list, static_repositories};
use super::BuildError;
use crate::config::BuildConfig;
use crate::matrix::{BuildTarget, discover_targets};
use crate::repo::{is_remote, to_repository_uri};

/// Placeholder for the extracted root, which is only known after extraction.
pub const DESTINATION_PLACEHOLDER: &str = "<extracted root>";

/// The planned build of one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetPlan {
  pub target: BuildTarget,
  pub install_units: Vec<String>,
  /// Repositories as the installer would receive them; remote ones are still URLs.
  pub repositories: Vec<String>,
  /// The distribution that would be written, if the base image name is supported.
  pub output: Option<PathBuf>,
  /// Installer program followed by its arguments.
  pub command: Vec<String>,
}

/// The planned builds of every discovered target.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
  pub targets: Vec<TargetPlan>,
}

/// Discover targets and resolve their inputs without touching the network or the installer.
pub fn plan_distros(config: &BuildConfig) -> Result<Plan, BuildError> {
  let targets = discover_targets(&config.target_dir).map_err(BuildError::io(format!(
    "failed to discover targets in '{}'",
    config.target_dir.display()
  )))?;

  let installer = config
    .installer
    .as_ref()
    .map(|p| p.display().to_string())
    .unwrap_or_else(|| "<installer>".to_string());

  let mut plan = Plan::default();
  for target in targets {
    let selection = Selection::for_target(config, &target);
    let declared = selection
      .repositories
      .iter()
      .map(|r| if is_remote(r) { r.clone() } else { to_repository_uri(Path::new(r)) })
      .collect();
    let statics = static_repositories(config, &target).map_err(BuildError::io("failed to list static repositories"))?;
    let repositories = repository_list(selection.update_sites, declared, statics);

    let mut command = vec![installer.clone()];
    command.extend(installer_args(
      &config.profile,
      &selection.install_units,
      &repositories,
      Path::new(DESTINATION_PLACEHOLDER),
    ));

    let output = distribution_file_name(&target.base_image_name(), &config.app_name).map(|n| config.dist_dir.join(n));

    plan.targets.push(TargetPlan {
      target,
      install_units: selection.install_units,
      repositories,
      output,
      command,
    });
  }

  Ok(plan)
}
