//! The build orchestrator.
//!
//! This module handles:
//! - Discovering targets and resolving each target's install units and repositories
//! - Extracting the base image into a scratch workspace and running the installer on it
//! - Repackaging successful installs into `<dist_dir>/<base>-<app><suffix>`
//!
//! # Failure handling
//!
//! An installer that exits non-zero or times out, and a repackaging step that fails,
//! only skip that target; the run continues and the skip is recorded in the
//! [`BuildReport`]. A missing installer, a failed repository download, a base image
//! that cannot be extracted, or an interrupt abort the whole run with a [`BuildError`].
//! An interrupt is noticed between targets, while repositories download, while the
//! base image is extracted and while the installer runs.
//!
//! # Workspaces
//!
//! With one job, every target reuses `<build_dir>/tmp`, wiped before each target. With
//! more jobs, each target gets its own `<build_dir>/tmp/<index>`. A workspace is removed
//! once its target is done.

mod command;
mod error;
mod plan;
mod select;
mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::archive;
use crate::config::BuildConfig;
use crate::matrix::{BuildTarget, discover_targets};
use crate::repo::RepositoryCache;
use crate::supervise::{self, Interrupt, SuperviseError};
use crate::util::fs::{remove_dir_if_exists, remove_file_if_exists};

pub use command::{distribution_file_name, installer_args};
pub use error::BuildError;
pub use plan::{DESTINATION_PLACEHOLDER, Plan, TargetPlan, plan_distros};
pub use types::{BuildReport, FailedTarget, PackagedTarget};

use select::{Selection, repository_list, static_repositories};
use types::TargetOutcome;

/// Build a distribution for every discovered target, stopping on Ctrl-C.
///
/// Must be called inside a tokio runtime.
pub async fn build_distros(config: &BuildConfig) -> Result<BuildReport, BuildError> {
  Orchestrator::new(config.clone(), Interrupt::ctrl_c()).run().await
}

/// Runs the per-target pipeline over the whole matrix.
pub struct Orchestrator {
  config: Arc<BuildConfig>,
  interrupt: Interrupt,
}

/// State shared by every target of one run.
struct RunContext {
  config: Arc<BuildConfig>,
  cache: RepositoryCache,
  installer: PathBuf,
  interrupt: Interrupt,
}

impl Orchestrator {
  pub fn new(config: BuildConfig, interrupt: Interrupt) -> Self {
    Self {
      config: Arc::new(config),
      interrupt,
    }
  }

  pub async fn run(&self) -> Result<BuildReport, BuildError> {
    let installer = check_installer(&self.config)?;

    let targets = discover_targets(&self.config.target_dir).map_err(BuildError::io(format!(
      "failed to discover targets in '{}'",
      self.config.target_dir.display()
    )))?;
    info!(
      target_count = targets.len(),
      jobs = self.config.jobs,
      target_dir = %self.config.target_dir.display(),
      "starting distribution builds"
    );

    let cache = RepositoryCache::new(&self.config.cache_dir(), self.config.http_timeout)?;
    let ctx = Arc::new(RunContext {
      config: self.config.clone(),
      cache,
      installer,
      interrupt: self.interrupt.clone(),
    });

    let outcomes = if self.config.jobs <= 1 {
      run_sequential(&ctx, targets).await?
    } else {
      run_parallel(ctx, targets).await?
    };

    let mut report = BuildReport::default();
    for (target, outcome) in outcomes {
      report.record(target, outcome);
    }

    info!(
      packaged = report.packaged.len(),
      failed = report.failed.len(),
      "distribution builds finished"
    );
    Ok(report)
  }
}

/// The installer must be configured and present before any target is touched.
fn check_installer(config: &BuildConfig) -> Result<PathBuf, BuildError> {
  let installer = config
    .installer_path()
    .ok_or_else(|| BuildError::Configuration("installer executable not defined".to_string()))?;

  if !installer.is_file() {
    return Err(BuildError::Configuration(format!(
      "installer executable not found at: {}",
      installer.display()
    )));
  }

  Ok(installer.to_path_buf())
}

async fn run_sequential(
  ctx: &RunContext,
  targets: Vec<BuildTarget>,
) -> Result<Vec<(BuildTarget, TargetOutcome)>, BuildError> {
  let workspace = ctx.config.workspace_dir();
  let mut outcomes = Vec::with_capacity(targets.len());

  for target in targets {
    let outcome = build_target(ctx, &target, &workspace).await?;
    outcomes.push((target, outcome));
  }

  Ok(outcomes)
}

/// Build up to `jobs` targets at once, each in its own workspace slot.
///
/// The first fatal error cancels the remaining targets. The workspace root is removed
/// once every task has finished or been cancelled.
async fn run_parallel(
  ctx: Arc<RunContext>,
  targets: Vec<BuildTarget>,
) -> Result<Vec<(BuildTarget, TargetOutcome)>, BuildError> {
  let semaphore = Arc::new(Semaphore::new(ctx.config.jobs));
  let workspace_root = ctx.config.workspace_dir();
  let mut join_set = JoinSet::new();

  for (index, target) in targets.into_iter().enumerate() {
    let ctx = ctx.clone();
    let semaphore = semaphore.clone();
    let workspace = workspace_root.join(index.to_string());

    join_set.spawn(async move {
      let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| BuildError::Task(e.to_string()))?;
      let outcome = build_target(&ctx, &target, &workspace).await?;
      Ok::<_, BuildError>((index, target, outcome))
    });
  }

  let mut outcomes = Vec::new();
  let mut fatal = None;
  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok(Ok(done)) => outcomes.push(done),
      Ok(Err(e)) => {
        fatal = Some(e);
        break;
      }
      Err(e) => {
        error!(error = %e, "build task panicked");
        fatal = Some(BuildError::Task(e.to_string()));
        break;
      }
    }
  }

  if fatal.is_some() {
    join_set.abort_all();
    while join_set.join_next().await.is_some() {}
  }

  if let Err(e) = remove_dir_if_exists(&workspace_root) {
    warn!(path = %workspace_root.display(), error = %e, "failed to remove workspace");
  }

  if let Some(e) = fatal {
    return Err(e);
  }

  outcomes.sort_by_key(|(index, _, _)| *index);
  Ok(outcomes.into_iter().map(|(_, target, outcome)| (target, outcome)).collect())
}

/// Run the whole pipeline for one target inside `workspace`.
async fn build_target(ctx: &RunContext, target: &BuildTarget, workspace: &Path) -> Result<TargetOutcome, BuildError> {
  if ctx.interrupt.is_triggered() {
    return Err(BuildError::Interrupted);
  }

  let config = &ctx.config;
  info!("Build distro for {} - {} - {}", target.version, target.os, target.arch);

  let selection = Selection::for_target(config, target);
  debug!(
    target = %target,
    install_units = ?selection.install_units,
    update_sites = ?selection.update_sites,
    repositories = ?selection.repositories,
    "selected declarations"
  );

  let materialized = tokio::select! {
    materialized = ctx.cache.materialize(&selection.repositories) => materialized?,
    _ = ctx.interrupt.triggered() => return Err(BuildError::Interrupted),
  };
  let statics = static_repositories(config, target).map_err(BuildError::io("failed to list static repositories"))?;
  let repositories = repository_list(selection.update_sites, materialized, statics);

  remove_dir_if_exists(workspace).map_err(BuildError::io(format!(
    "failed to clear workspace '{}'",
    workspace.display()
  )))?;

  let extracted = tokio::select! {
    extracted = extract_image(&target.base_image, workspace) => extracted,
    _ = ctx.interrupt.triggered() => Err(BuildError::Interrupted),
  };
  let result = match extracted {
    Ok(root) => install_and_package(ctx, target, &selection.install_units, &repositories, &root).await,
    Err(e) => Err(e),
  };

  if let Err(e) = remove_dir_if_exists(workspace) {
    warn!(path = %workspace.display(), error = %e, "failed to remove workspace");
  }

  result
}

async fn extract_image(image: &Path, workspace: &Path) -> Result<PathBuf, BuildError> {
  let (archive_path, dest) = (image.to_path_buf(), workspace.to_path_buf());

  tokio::task::spawn_blocking(move || archive::extract(&archive_path, &dest))
    .await
    .map_err(|e| BuildError::Task(e.to_string()))?
    .map_err(|source| BuildError::Archive {
      path: image.to_path_buf(),
      source,
    })
}

async fn install_and_package(
  ctx: &RunContext,
  target: &BuildTarget,
  install_units: &[String],
  repositories: &[String],
  root: &Path,
) -> Result<TargetOutcome, BuildError> {
  let config = &ctx.config;
  let args = installer_args(&config.profile, install_units, repositories, root);

  let exit = match supervise::run(&ctx.installer, &args, config.installer_timeout, &ctx.interrupt).await {
    Ok(exit) => exit,
    Err(SuperviseError::Interrupted { .. }) => return Err(BuildError::Interrupted),
    Err(source @ SuperviseError::Spawn { .. }) => {
      return Err(BuildError::InvalidInstaller {
        path: ctx.installer.clone(),
        source,
      });
    }
    Err(e) => {
      error!(target = %target, error = %e, "Export failed");
      return Ok(TargetOutcome::Failed(e.to_string()));
    }
  };

  if !exit.success() {
    error!(target = %target, %exit, "Export failed");
    return Ok(TargetOutcome::Failed(format!("installer failed with {exit}")));
  }

  let base_name = target.base_image_name();
  let Some(file_name) = distribution_file_name(&base_name, &config.app_name) else {
    return Ok(TargetOutcome::Failed(format!("unsupported base image name '{base_name}'")));
  };
  let output = config.dist_dir.join(file_name);

  let (source_dir, target_file) = (root.to_path_buf(), output.clone());
  let packaged = tokio::task::spawn_blocking(move || archive::compress(&source_dir, &target_file))
    .await
    .map_err(|e| BuildError::Task(e.to_string()))?;

  match packaged {
    Ok(()) => {
      info!(target = %target, output = %output.display(), "packaged distribution");
      Ok(TargetOutcome::Packaged(output))
    }
    Err(e) => {
      error!(target = %target, output = %output.display(), error = %e, "packaging failed");
      if let Err(e) = remove_file_if_exists(&output) {
        warn!(path = %output.display(), error = %e, "failed to remove partial output");
      }
      Ok(TargetOutcome::Failed(format!("packaging failed: {e}")))
    }
  }
}
