use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Collect the paths of all files below `dir`, relative to `dir` and sorted.
///
/// Directories are not listed; they are implied by the file paths. Symlinks are followed.
pub fn collect_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
  let mut files = Vec::new();

  for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
    let entry = entry.map_err(io::Error::from)?;
    if !entry.file_type().is_file() {
      continue;
    }

    let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
    files.push(rel.to_path_buf());
  }

  files.sort();
  Ok(files)
}

/// Archive entry name for `rel` below the top-level directory `base_name`, `/`-separated.
///
/// Names that are not valid UTF-8 are converted lossily here, since zip entry names are text.
pub(super) fn entry_name(base_name: &str, rel: &Path) -> String {
  let mut name = base_name.to_string();
  for component in rel.components() {
    name.push('/');
    name.push_str(&component.as_os_str().to_string_lossy());
  }
  name
}
