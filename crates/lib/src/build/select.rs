//! Per-target selection of install units and repositories.

use std::io;

use crate::config::BuildConfig;
use crate::consts::SHARED_REPOS_DIR;
use crate::matrix::{BuildTarget, collect_zip_repositories, filter_declarations};

/// The declarations that apply to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selection {
  pub install_units: Vec<String>,
  pub update_sites: Vec<String>,
  /// Repositories still to be materialized.
  pub repositories: Vec<String>,
}

impl Selection {
  pub fn for_target(config: &BuildConfig, target: &BuildTarget) -> Self {
    let (v, o, a) = (target.version.as_str(), target.os.as_str(), target.arch.as_str());
    Self {
      install_units: filter_declarations(&config.install_units, v, o, a),
      update_sites: filter_declarations(&config.update_sites, v, o, a),
      repositories: filter_declarations(&config.repositories, v, o, a),
    }
  }
}

/// Static repositories for a target: the `shared` ones first, then the version's own.
pub(crate) fn static_repositories(config: &BuildConfig, target: &BuildTarget) -> io::Result<Vec<String>> {
  let Some(root) = config.static_repos_dir.as_deref() else {
    return Ok(Vec::new());
  };

  let mut repos = collect_zip_repositories(root, SHARED_REPOS_DIR, &target.os, &target.arch)?;
  repos.extend(collect_zip_repositories(root, &target.version, &target.os, &target.arch)?);
  Ok(repos)
}

/// The repository list handed to the installer, in order: update sites,
/// materialized repositories, static repositories.
pub(crate) fn repository_list(update_sites: Vec<String>, materialized: Vec<String>, static_repos: Vec<String>) -> Vec<String> {
  let mut repos = update_sites;
  repos.extend(materialized);
  repos.extend(static_repos);
  repos
}
