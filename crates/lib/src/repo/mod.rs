//! Repository materialization.
//!
//! This module handles:
//! - Downloading remote repository archives into the cache directory
//! - Revalidating cached archives against the server's `Last-Modified`
//! - Rewriting local paths into the `jar:file:...!/` form the installer reads
//!
//! # Cache Structure
//!
//! Remote repositories are cached at `<build_dir>/cache/<sha256 of url>.zip`. A download
//! streams into `<key>.zip.part` and is renamed into place once complete.

mod download;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{APP_NAME, ZIP_SUFFIX};
use crate::util::hash::hash_bytes;

/// Errors that can occur while materializing repositories.
#[derive(Debug, Error)]
pub enum CacheError {
  /// Failed to create the cache directory.
  #[error("failed to create cache directory '{0}': {1}")]
  CreateCacheDir(PathBuf, #[source] std::io::Error),

  /// Failed to set up the HTTP client.
  #[error("failed to create http client: {0}")]
  Client(#[source] reqwest::Error),

  /// The request or the body stream failed.
  #[error("failed to fetch '{url}': {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered the download with a non-success status.
  #[error("failed to fetch '{url}': HTTP {status}")]
  Status { url: String, status: reqwest::StatusCode },

  /// Failed to write or move a cache file.
  #[error("failed to write cache file '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Returns true if the repository string names a remote location.
pub fn is_remote(repository: &str) -> bool {
  repository.starts_with("http://") || repository.starts_with("https://")
}

/// The cache file name for a remote URL: hex SHA256 of the URL string plus `.zip`.
pub fn cache_key(url: &str) -> String {
  format!("{}{}", hash_bytes(url.as_bytes()), ZIP_SUFFIX)
}

/// Rewrite a local archive path into the repository URI the installer reads.
///
/// The installer reads repository metadata straight from the archive, so no
/// extraction is needed: `/repos/site.zip` becomes `jar:file:/repos/site.zip!/`.
pub fn to_repository_uri(path: &Path) -> String {
  let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
  let name = absolute
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let dir = absolute
    .parent()
    .map(|p| p.display().to_string())
    .unwrap_or_default();
  format!("jar:file:{dir}/{name}!/")
}

/// A directory of downloaded repository archives keyed by URL digest.
///
/// Safe to share between concurrently building targets: downloads of the same key
/// are serialized, different keys proceed in parallel.
#[derive(Debug)]
pub struct RepositoryCache {
  cache_dir: PathBuf,
  client: reqwest::Client,
  key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RepositoryCache {
  /// Open (creating if needed) the cache at `cache_dir`.
  ///
  /// `timeout` bounds every HEAD and GET request when set.
  pub fn new(cache_dir: &Path, timeout: Option<Duration>) -> Result<Self, CacheError> {
    std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::CreateCacheDir(cache_dir.to_path_buf(), e))?;

    let mut builder = reqwest::Client::builder().user_agent(format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(CacheError::Client)?;

    Ok(Self {
      cache_dir: cache_dir.to_path_buf(),
      client,
      key_locks: Mutex::new(HashMap::new()),
    })
  }

  pub fn cache_dir(&self) -> &Path {
    &self.cache_dir
  }

  /// Where the archive for `url` lives in the cache.
  pub fn cache_path(&self, url: &str) -> PathBuf {
    self.cache_dir.join(cache_key(url))
  }

  /// Resolve every repository to a locally readable repository URI, in order.
  ///
  /// Remote repositories are downloaded (or revalidated) first; local paths are
  /// rewritten as they are.
  pub async fn materialize(&self, repositories: &[String]) -> Result<Vec<String>, CacheError> {
    let mut resolved = Vec::with_capacity(repositories.len());

    for repository in repositories {
      let local = if is_remote(repository) {
        self.fetch(repository).await?
      } else {
        PathBuf::from(repository)
      };
      resolved.push(to_repository_uri(&local));
    }

    Ok(resolved)
  }

  /// Make sure the cache holds a fresh copy of `url` and return its path.
  pub async fn fetch(&self, url: &str) -> Result<PathBuf, CacheError> {
    let key = cache_key(url);
    let path = self.cache_dir.join(&key);

    let lock = self.key_lock(&key);
    let _guard = lock.lock().await;

    if path.exists() {
      if !download::is_stale(&self.client, url, &path).await {
        info!(url, path = %path.display(), "using cached repository");
        return Ok(path);
      }
      info!(url, "cached repository is outdated, downloading");
    } else {
      debug!(url, path = %path.display(), "repository not cached");
    }

    download::download(&self.client, url, &path).await?;
    Ok(path)
  }

  fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(key.to_string()).or_default().clone()
  }
}
