//! The (version, os, arch) build matrix.
//!
//! This module handles:
//! - Discovering build targets from the `version/os/arch/<base-image>` tree
//! - Filtering declarations down to the ones that apply to one matrix point
//! - Collecting static, pre-built repository archives for a matrix point

mod discover;
mod filter;
mod static_repos;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

pub use discover::discover_targets;
pub use filter::{filter_declarations, selector_matches};
pub use static_repos::collect_zip_repositories;

/// One base image to build a distribution from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
  pub version: String,
  pub os: String,
  pub arch: String,
  /// The archive found directly inside the arch directory.
  pub base_image: PathBuf,
}

impl BuildTarget {
  /// File name of the base image, used to derive the output name.
  pub fn base_image_name(&self) -> String {
    self
      .base_image
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

impl fmt::Display for BuildTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}-{}/{}", self.version, self.os, self.arch, self.base_image_name())
  }
}
