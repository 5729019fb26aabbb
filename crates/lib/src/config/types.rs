//! Types describing a distribution build.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{CACHE_DIR_NAME, DEFAULT_APP_NAME, DEFAULT_PROFILE, WORKSPACE_DIR_NAME};

/// A value restricted to part of the build matrix.
///
/// Used for install units, update sites and repositories alike. A selector that is
/// absent (or empty) matches every value of its dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
  /// The install unit id or repository location.
  pub value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub os: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arch: Option<String>,
}

impl Declaration {
  /// A declaration that applies to every target.
  pub fn new(value: impl Into<String>) -> Self {
    Self {
      value: value.into(),
      ..Default::default()
    }
  }

  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = Some(version.into());
    self
  }

  pub fn with_os(mut self, os: impl Into<String>) -> Self {
    self.os = Some(os.into());
    self
  }

  pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
    self.arch = Some(arch.into());
    self
  }
}

/// The complete, immutable configuration of one build invocation.
///
/// Built once before the pipeline runs and passed by reference to every component.
/// All paths are absolute once loaded through [`BuildConfig::from_file`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Root of the `version/os/arch/<base-image>` tree.
  pub target_dir: PathBuf,
  /// Installer executable. Required when building, optional when planning.
  pub installer: Option<PathBuf>,
  /// Root of the pre-built `<version|shared>/<os>/[<arch>/]*.zip` repositories.
  pub static_repos_dir: Option<PathBuf>,
  /// Working directory holding the repository cache and extraction workspace.
  pub build_dir: PathBuf,
  /// Directory receiving the repackaged distributions.
  pub dist_dir: PathBuf,
  /// Installer profile name.
  pub profile: String,
  /// Suffix inserted into every output name.
  pub app_name: String,
  /// Number of targets built concurrently.
  pub jobs: usize,
  /// Kill the installer after this long. `None` waits forever.
  pub installer_timeout: Option<Duration>,
  /// Per-request timeout for repository HEAD/GET requests.
  pub http_timeout: Option<Duration>,
  pub install_units: Vec<Declaration>,
  pub update_sites: Vec<Declaration>,
  pub repositories: Vec<Declaration>,
}

impl BuildConfig {
  /// A configuration with defaults for everything but the three required directories.
  pub fn new(target_dir: impl Into<PathBuf>, build_dir: impl Into<PathBuf>, dist_dir: impl Into<PathBuf>) -> Self {
    Self {
      target_dir: target_dir.into(),
      installer: None,
      static_repos_dir: None,
      build_dir: build_dir.into(),
      dist_dir: dist_dir.into(),
      profile: DEFAULT_PROFILE.to_string(),
      app_name: DEFAULT_APP_NAME.to_string(),
      jobs: 1,
      installer_timeout: None,
      http_timeout: None,
      install_units: Vec::new(),
      update_sites: Vec::new(),
      repositories: Vec::new(),
    }
  }

  /// Directory holding downloaded repositories, keyed by URL digest.
  pub fn cache_dir(&self) -> PathBuf {
    self.build_dir.join(CACHE_DIR_NAME)
  }

  /// The extraction workspace, wiped before every target.
  pub fn workspace_dir(&self) -> PathBuf {
    self.build_dir.join(WORKSPACE_DIR_NAME)
  }

  pub fn installer_path(&self) -> Option<&Path> {
    self.installer.as_deref()
  }
}

/// On-disk representation of the config file.
///
/// Paths are kept as written and resolved against the config file's directory.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
  pub target_dir: PathBuf,
  pub build_dir: PathBuf,
  pub dist_dir: PathBuf,
  #[serde(default)]
  pub installer: Option<PathBuf>,
  #[serde(default)]
  pub static_repos_dir: Option<PathBuf>,
  #[serde(default)]
  pub profile: Option<String>,
  #[serde(default)]
  pub app_name: Option<String>,
  #[serde(default)]
  pub jobs: Option<usize>,
  #[serde(default)]
  pub installer_timeout_secs: Option<u64>,
  #[serde(default)]
  pub http_timeout_secs: Option<u64>,
  #[serde(default, rename = "install_unit")]
  pub install_units: Vec<Declaration>,
  #[serde(default, rename = "update_site")]
  pub update_sites: Vec<Declaration>,
  #[serde(default, rename = "repository")]
  pub repositories: Vec<Declaration>,
}
