use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::BuildTarget;

/// Depth of base images below the target root: version/os/arch/<file>.
const BASE_IMAGE_DEPTH: usize = 4;

/// Enumerate build targets below `target_dir`.
///
/// Walks exactly three directory levels (version, os, arch) and yields every regular
/// file directly inside an arch directory as one target. Files at the upper levels are
/// ignored. A missing or non-directory root yields no targets.
///
/// Entries that cannot be read, such as dangling symlinks, are skipped, and so are
/// version, os or arch directories whose names are not valid UTF-8.
///
/// Entries are visited in file name order.
pub fn discover_targets(target_dir: &Path) -> io::Result<Vec<BuildTarget>> {
  if !target_dir.is_dir() {
    debug!(path = %target_dir.display(), "target directory missing, no targets");
    return Ok(Vec::new());
  }

  let walker = WalkDir::new(target_dir)
    .min_depth(BASE_IMAGE_DEPTH)
    .max_depth(BASE_IMAGE_DEPTH)
    .follow_links(true)
    .sort_by_file_name();

  let mut targets = Vec::new();
  for entry in walker {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        warn!(path = ?e.path(), error = %e, "skipping unreadable entry in target tree");
        continue;
      }
    };
    if !entry.file_type().is_file() {
      continue;
    }

    let rel = entry.path().strip_prefix(target_dir).unwrap_or(entry.path());
    let dirs: Option<Vec<&str>> = rel.components().take(3).map(|c| c.as_os_str().to_str()).collect();
    let Some([version, os, arch]) = dirs.as_deref() else {
      warn!(path = %entry.path().display(), "skipping base image below a non UTF-8 directory name");
      continue;
    };

    targets.push(BuildTarget {
      version: version.to_string(),
      os: os.to_string(),
      arch: arch.to_string(),
      base_image: entry.path().to_path_buf(),
    });
  }

  debug!(count = targets.len(), "discovered build targets");
  Ok(targets)
}
