//! Archive extraction and repackaging.
//!
//! Supports:
//! - `.tar.gz` (tar entries inside a gzip stream, execute bits preserved)
//! - `.zip` (no permission handling)
//!
//! Archives are expected to hold a single top-level directory. [`extract`] returns
//! that directory and [`compress`] writes every file below a directory under its
//! base name, so `compress` followed by `extract` reproduces the tree.

mod collect;
mod tgz;
mod zip_archive;

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::{TAR_GZ_SUFFIX, ZIP_SUFFIX};

pub use collect::collect_files;

/// Errors that can occur while reading or writing archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
  /// The file name carries a suffix we cannot dispatch on.
  #[error("unsupported archive format: {0}")]
  UnsupportedFormat(PathBuf),

  /// The archive could not be decoded.
  #[error("malformed archive '{path}': {message}")]
  Malformed { path: PathBuf, message: String },

  /// An entry would be written outside the destination directory.
  #[error("archive '{archive}' has unsafe entry '{entry}'")]
  UnsafeEntry { archive: PathBuf, entry: String },

  /// The archive holds an entry type we refuse to extract.
  #[error("archive '{archive}' entry '{entry}': {feature} not supported")]
  UnsupportedFeature {
    archive: PathBuf,
    entry: String,
    feature: &'static str,
  },

  /// The archive has no entries to derive a root directory from.
  #[error("archive '{0}' has no top-level directory")]
  NoRootDirectory(PathBuf),

  /// I/O error on a file being read or written.
  #[error("io error on '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl ArchiveError {
  pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

/// Archive formats, dispatched by file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
  TarGz,
  Zip,
}

impl ArchiveFormat {
  /// Detect the format from the file name, if supported.
  pub fn from_path(path: &Path) -> Option<Self> {
    let name = path.file_name()?.to_str()?;
    Self::from_name(name)
  }

  pub fn from_name(name: &str) -> Option<Self> {
    if name.ends_with(TAR_GZ_SUFFIX) {
      Some(Self::TarGz)
    } else if name.ends_with(ZIP_SUFFIX) {
      Some(Self::Zip)
    } else {
      None
    }
  }

  pub fn suffix(&self) -> &'static str {
    match self {
      Self::TarGz => TAR_GZ_SUFFIX,
      Self::Zip => ZIP_SUFFIX,
    }
  }
}

/// Extract `archive` into `dest`, returning the archive's top-level directory.
///
/// The root is the first directory entry in the archive. Archives without explicit
/// directory entries use the top-level component of their first entry.
pub fn extract(archive: &Path, dest: &Path) -> Result<PathBuf, ArchiveError> {
  let format = ArchiveFormat::from_path(archive).ok_or_else(|| ArchiveError::UnsupportedFormat(archive.to_path_buf()))?;

  std::fs::create_dir_all(dest).map_err(ArchiveError::io(dest))?;

  let root = match format {
    ArchiveFormat::TarGz => tgz::extract(archive, dest)?,
    ArchiveFormat::Zip => zip_archive::extract(archive, dest)?,
  };

  info!(archive = %archive.display(), root = %root.display(), "extracted archive");
  Ok(root)
}

/// Write every file below `source_dir` into `target`, named `<source base name>/<relative path>`.
///
/// The format follows `target`'s suffix. Parent directories of `target` are created.
pub fn compress(source_dir: &Path, target: &Path) -> Result<(), ArchiveError> {
  let format = ArchiveFormat::from_path(target).ok_or_else(|| ArchiveError::UnsupportedFormat(target.to_path_buf()))?;

  let base_name = source_dir.file_name().ok_or_else(|| ArchiveError::Malformed {
    path: source_dir.to_path_buf(),
    message: "source directory has no name".to_string(),
  })?;

  let files = collect_files(source_dir).map_err(ArchiveError::io(source_dir))?;

  if let Some(parent) = target.parent() {
    std::fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
  }

  match format {
    ArchiveFormat::TarGz => tgz::compress(source_dir, base_name, &files, target)?,
    ArchiveFormat::Zip => zip_archive::compress(source_dir, base_name, &files, target)?,
  }

  info!(source = %source_dir.display(), target = %target.display(), files = files.len(), "created archive");
  Ok(())
}

/// Normalize an entry path, rejecting absolute paths and `..` components.
///
/// `./` components are dropped, so `./` itself normalizes to an empty path.
fn sanitize_entry(entry: &Path) -> Option<PathBuf> {
  let mut clean = PathBuf::new();
  for component in entry.components() {
    match component {
      Component::Normal(part) => clean.push(part),
      Component::CurDir => {}
      Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
    }
  }
  Some(clean)
}

/// Tracks the root directory while entries stream by.
#[derive(Debug, Default)]
struct RootTracker {
  first_dir: Option<PathBuf>,
  first_top_level: Option<PathBuf>,
}

impl RootTracker {
  fn directory(&mut self, path: PathBuf) {
    if self.first_dir.is_none() {
      self.first_dir = Some(path);
    }
  }

  fn entry(&mut self, rel: &Path, dest: &Path) {
    if self.first_top_level.is_none()
      && let Some(Component::Normal(top)) = rel.components().next()
    {
      self.first_top_level = Some(dest.join(top));
    }
  }

  fn finish(self, archive: &Path) -> Result<PathBuf, ArchiveError> {
    self
      .first_dir
      .or(self.first_top_level)
      .ok_or_else(|| ArchiveError::NoRootDirectory(archive.to_path_buf()))
  }
}
