//! Shared helpers for pipeline tests.

use std::path::{Path, PathBuf};

use distrobuild_lib::archive;
use distrobuild_lib::util::fs::set_executable;
use tempfile::TempDir;

/// An installer stand-in: records its arguments in `<script>.args`, then writes
/// `plugins/installed.txt` under `-destination` and exits 0, or exits with `exit_code`.
const INSTALLER_SCRIPT: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "$0.args"
dest=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-destination" ]; then dest="$arg"; fi
  prev="$arg"
done
echo "Installing into $dest"
if [ "__EXIT__" -ne 0 ]; then
  echo "Installation failed" >&2
  exit __EXIT__
fi
mkdir -p "$dest/plugins"
echo installed > "$dest/plugins/installed.txt"
"#;

/// Isolated pipeline environment.
///
/// Layout under the temp directory: `targets/`, `build/`, `dist/`, `repos/`.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn target_dir(&self) -> PathBuf {
    self.root().join("targets")
  }

  pub fn build_dir(&self) -> PathBuf {
    self.root().join("build")
  }

  pub fn dist_dir(&self) -> PathBuf {
    self.root().join("dist")
  }

  /// Write the installer stand-in and return its path.
  pub fn installer(&self, exit_code: i32) -> PathBuf {
    let path = self.root().join("installer.sh");
    std::fs::write(&path, INSTALLER_SCRIPT.replace("__EXIT__", &exit_code.to_string())).unwrap();
    set_executable(&path).unwrap();
    path
  }

  /// Arguments the installer stand-in received on its last run.
  pub fn installer_args(&self) -> Vec<String> {
    std::fs::read_to_string(self.root().join("installer.sh.args"))
      .unwrap()
      .lines()
      .map(str::to_string)
      .collect()
  }

  /// Add a base image at `targets/<version>/<os>/<arch>/<name>` rooted at `eclipse/`.
  pub fn add_target(&self, version: &str, os: &str, arch: &str, name: &str) -> PathBuf {
    let image = self.target_dir().join(version).join(os).join(arch).join(name);
    let staging = TempDir::new().unwrap();
    let root = staging.path().join("eclipse");
    std::fs::create_dir_all(root.join("configuration")).unwrap();
    std::fs::write(root.join("eclipse.ini"), "-vmargs\n").unwrap();
    std::fs::write(root.join("configuration/config.ini"), "osgi.instance.area.default=@user.home\n").unwrap();
    archive::compress(&root, &image).unwrap();
    image
  }

  /// Write an empty file at a path relative to the temp directory.
  pub fn touch(&self, relative_path: &str) -> PathBuf {
    let path = self.root().join(relative_path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"").unwrap();
    path
  }
}

/// Unpack `archive_path` into a fresh directory and list its files relative to the root.
pub fn archive_files(archive_path: &Path) -> Vec<String> {
  let dest = TempDir::new().unwrap();
  let root = archive::extract(archive_path, dest.path()).unwrap();
  archive::collect_files(&root)
    .unwrap()
    .iter()
    .map(|rel| rel.to_string_lossy().into_owned())
    .collect()
}
