use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::repo::CacheError;
use crate::supervise::SuperviseError;

/// A fatal failure of the whole build run.
///
/// Per-target installer failures are not errors; they are recorded in the
/// [`BuildReport`](super::BuildReport) and the run continues.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The installer executable is not configured or does not exist.
  #[error("{0}")]
  Configuration(String),

  /// The installer exists but could not be started.
  #[error("installer '{path}' cannot be executed: {source}")]
  InvalidInstaller {
    path: PathBuf,
    #[source]
    source: SuperviseError,
  },

  /// A repository could not be downloaded or cached.
  #[error("error downloading repositories: {0}")]
  RepositoryFetch(#[from] CacheError),

  /// A base image could not be extracted.
  #[error("failed to extract target image '{path}': {source}")]
  Archive {
    path: PathBuf,
    #[source]
    source: ArchiveError,
  },

  /// The run was interrupted.
  #[error("interrupted while waiting for the installer to finish")]
  Interrupted,

  /// Filesystem error outside of archive handling.
  #[error("{context}: {source}")]
  Io {
    context: String,
    #[source]
    source: std::io::Error,
  },

  /// A build task panicked or was cancelled.
  #[error("build task failed: {0}")]
  Task(String),
}

impl BuildError {
  pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> BuildError {
    let context = context.into();
    move |source| BuildError::Io { context, source }
  }
}
