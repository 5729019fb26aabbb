//! Build configuration loading.
//!
//! A build is described by a TOML file:
//!
//! ```toml
//! target_dir = "targets"
//! build_dir = "build"
//! dist_dir = "dist"
//! installer = "/opt/eclipse/eclipse"
//! app_name = "myapp"
//!
//! [[install_unit]]
//! value = "org.example.feature.feature.group"
//!
//! [[repository]]
//! value = "http://download.example.com/updates.zip"
//! os = "linux"
//! ```
//!
//! Relative paths are resolved against the directory containing the file.

mod types;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

pub use types::{BuildConfig, Declaration};
use types::ConfigFile;

use crate::consts::{DEFAULT_APP_NAME, DEFAULT_PROFILE};

/// Errors that can occur while loading a build configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("failed to read config '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The config file is not valid TOML or has unknown/missing keys.
  #[error("failed to parse config '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: Box<toml::de::Error>,
  },

  /// The config parsed but holds a value that cannot be used.
  #[error("invalid config: {0}")]
  Invalid(String),
}

impl BuildConfig {
  /// Load a configuration from a TOML file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;

    let absolute = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let base_dir = absolute.parent().map(Path::to_path_buf).unwrap_or_default();

    Self::from_toml_str(&content, &base_dir).map_err(|e| match e {
      ConfigError::Parse { source, .. } => ConfigError::Parse {
        path: path.to_path_buf(),
        source,
      },
      other => other,
    })
  }

  /// Parse a configuration, resolving relative paths against `base_dir`.
  pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
    let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
      path: PathBuf::new(),
      source: Box::new(e),
    })?;

    let jobs = file.jobs.unwrap_or(1);
    if jobs == 0 {
      return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
    }

    for (kind, decls) in [
      ("install_unit", &file.install_units),
      ("update_site", &file.update_sites),
      ("repository", &file.repositories),
    ] {
      if let Some(index) = decls.iter().position(|d| d.value.trim().is_empty()) {
        return Err(ConfigError::Invalid(format!("{kind} #{} has an empty value", index + 1)));
      }
    }

    let resolve = |p: PathBuf| resolve_path(p, base_dir);

    let config = BuildConfig {
      target_dir: resolve(file.target_dir),
      installer: file.installer.map(resolve),
      static_repos_dir: file.static_repos_dir.map(resolve),
      build_dir: resolve(file.build_dir),
      dist_dir: resolve(file.dist_dir),
      profile: non_empty_or(file.profile, DEFAULT_PROFILE),
      app_name: non_empty_or(file.app_name, DEFAULT_APP_NAME),
      jobs,
      installer_timeout: file.installer_timeout_secs.map(Duration::from_secs),
      http_timeout: file.http_timeout_secs.map(Duration::from_secs),
      install_units: file.install_units,
      update_sites: file.update_sites,
      repositories: file.repositories,
    };

    debug!(
      target_dir = %config.target_dir.display(),
      build_dir = %config.build_dir.display(),
      install_units = config.install_units.len(),
      update_sites = config.update_sites.len(),
      repositories = config.repositories.len(),
      "loaded build config"
    );

    Ok(config)
  }
}

fn resolve_path(path: PathBuf, base_dir: &Path) -> PathBuf {
  if path.is_absolute() { path } else { base_dir.join(path) }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
  value
    .filter(|v| !v.trim().is_empty())
    .unwrap_or_else(|| default.to_string())
}
