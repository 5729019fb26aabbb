//! Freshness checks and atomic downloads for cached repositories.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::LAST_MODIFIED;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::CacheError;
use crate::consts::PART_SUFFIX;

/// Returns true if the server reports a copy newer than the cached file.
///
/// Only a successful HEAD with a parseable `Last-Modified` later than the file's
/// modification time counts as stale. Any failure to check (network error, non-OK
/// status, missing header) keeps the cached file.
pub(super) async fn is_stale(client: &reqwest::Client, url: &str, cached: &Path) -> bool {
  let local_modified = match fs::metadata(cached).await.and_then(|m| m.modified()) {
    Ok(modified) => modified,
    Err(e) => {
      debug!(path = %cached.display(), error = %e, "cannot read cached file time, treating as stale");
      return true;
    }
  };

  let response = match client.head(url).send().await {
    Ok(response) => response,
    Err(e) => {
      warn!(url, error = %e, "freshness check failed, reusing cached repository");
      return false;
    }
  };

  if response.status() != StatusCode::OK {
    warn!(url, status = %response.status(), "freshness check not OK, reusing cached repository");
    return false;
  }

  let remote_modified = response
    .headers()
    .get(LAST_MODIFIED)
    .and_then(|v| v.to_str().ok())
    .and_then(parse_http_date);

  match remote_modified {
    Some(remote) => {
      debug!(url, ?remote, ?local_modified, "comparing modification times");
      local_modified < remote
    }
    None => false,
  }
}

/// Parse an HTTP date such as `Sun, 06 Nov 1994 08:49:37 GMT`.
pub(super) fn parse_http_date(value: &str) -> Option<SystemTime> {
  DateTime::parse_from_rfc2822(value.trim())
    .ok()
    .map(|dt| SystemTime::from(dt.with_timezone(&Utc)))
}

/// Download `url` to `target` atomically.
///
/// Any existing file at `target` is removed first. The body streams into
/// `<target>.part`, which is renamed to `target` only after the stream completes.
/// On failure the partial file is removed and `target` does not exist.
pub(super) async fn download(client: &reqwest::Client, url: &str, target: &Path) -> Result<(), CacheError> {
  info!(url, "downloading repository");

  remove_if_exists(target).await?;
  let part = part_path(target);

  let result = stream_to(client, url, &part).await;
  if result.is_err() {
    let _ = fs::remove_file(&part).await;
    return result.map(|_| ());
  }
  let size = result?;

  fs::rename(&part, target).await.map_err(|e| CacheError::Write {
    path: target.to_path_buf(),
    source: e,
  })?;

  info!(url, path = %target.display(), size, "download complete");
  Ok(())
}

async fn stream_to(client: &reqwest::Client, url: &str, part: &Path) -> Result<u64, CacheError> {
  let request_err = |e: reqwest::Error| CacheError::Request {
    url: url.to_string(),
    source: e,
  };
  let write_err = |e: std::io::Error| CacheError::Write {
    path: part.to_path_buf(),
    source: e,
  };

  let mut response = client.get(url).send().await.map_err(request_err)?;
  if !response.status().is_success() {
    return Err(CacheError::Status {
      url: url.to_string(),
      status: response.status(),
    });
  }

  let mut file = fs::File::create(part).await.map_err(write_err)?;
  let mut size = 0u64;
  while let Some(chunk) = response.chunk().await.map_err(request_err)? {
    file.write_all(&chunk).await.map_err(write_err)?;
    size += chunk.len() as u64;
  }
  file.flush().await.map_err(write_err)?;
  file.sync_all().await.map_err(write_err)?;

  Ok(size)
}

fn part_path(target: &Path) -> PathBuf {
  let mut name = target.as_os_str().to_owned();
  name.push(PART_SUFFIX);
  PathBuf::from(name)
}

async fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
  match fs::remove_file(path).await {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(CacheError::Write {
      path: path.to_path_buf(),
      source: e,
    }),
  }
}
