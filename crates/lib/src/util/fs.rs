//! Filesystem helpers shared by the archive codec and the orchestrator.

use std::io;
use std::path::Path;

/// Remove a directory tree if it exists.
///
/// A missing directory is not an error.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
  match std::fs::remove_dir_all(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e),
  }
}

/// Remove a file if it exists.
pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
  match std::fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e),
  }
}

/// Returns true if any execute bit (owner, group or other) is set on the file.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> io::Result<bool> {
  use std::os::unix::fs::PermissionsExt;

  let mode = std::fs::metadata(path)?.permissions().mode();
  Ok(mode & 0o111 != 0)
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> io::Result<bool> {
  Ok(false)
}

/// Mark a file executable for owner, group and other, keeping its other bits.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let mut perms = std::fs::metadata(path)?.permissions();
  perms.set_mode(perms.mode() | 0o111);
  std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> io::Result<()> {
  Ok(())
}
