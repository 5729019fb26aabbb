use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::ZIP_SUFFIX;
use crate::repo::to_repository_uri;

/// Collect pre-built repository archives shipped under `root_dir/<selector>`.
///
/// The tree is shaped `<selector>/<os>/[<arch>/]*.zip`, where `selector` is a version
/// or `shared`:
/// - zips directly in `<selector>/` apply to every os and arch
/// - zips directly in `<selector>/<os>/` apply to every arch of that os
/// - zips in `<selector>/<os>/<arch>/` apply to that os and arch only
///
/// Returns the archives in repository-URI form. A missing selector directory yields nothing.
pub fn collect_zip_repositories(root_dir: &Path, selector: &str, os: &str, arch: &str) -> io::Result<Vec<String>> {
  let selector_dir = root_dir.join(selector);
  let mut collected = Vec::new();

  if !selector_dir.is_dir() {
    return Ok(collected);
  }

  for entry in sorted_entries(&selector_dir)? {
    if entry.is_dir() && file_name_is(&entry, os) {
      for os_entry in sorted_entries(&entry)? {
        if os_entry.is_dir() {
          if file_name_is(&os_entry, arch) {
            for arch_entry in sorted_entries(&os_entry)? {
              if is_zip_file(&arch_entry) {
                collected.push(to_repository_uri(&arch_entry));
              }
            }
          }
        } else if is_zip_file(&os_entry) {
          collected.push(to_repository_uri(&os_entry));
        }
      }
    } else if is_zip_file(&entry) {
      collected.push(to_repository_uri(&entry));
    }
  }

  debug!(selector, os, arch, count = collected.len(), "collected static repositories");
  Ok(collected)
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
  let mut entries = std::fs::read_dir(dir)?
    .map(|e| e.map(|e| e.path()))
    .collect::<io::Result<Vec<_>>>()?;
  entries.sort();
  Ok(entries)
}

fn file_name_is(path: &Path, name: &str) -> bool {
  path.file_name().is_some_and(|n| n == name)
}

fn is_zip_file(path: &Path) -> bool {
  path.is_file()
    && path
      .file_name()
      .and_then(|n| n.to_str())
      .is_some_and(|n| n.ends_with(ZIP_SUFFIX))
}
