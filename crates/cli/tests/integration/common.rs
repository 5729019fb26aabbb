//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

use distrobuild_lib::archive;
use distrobuild_lib::util::fs::set_executable;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding `distro.toml`, the target tree,
/// the build directory and the dist directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("distro.toml");
    Self { temp, config_path }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write `distro.toml` with the standard layout followed by `extra`.
  pub fn write_config(&self, extra: &str) {
    let content = format!(
      r#"target_dir = "targets"
build_dir = "build"
dist_dir = "dist"
app_name = "myapp"
{extra}"#
    );
    std::fs::write(&self.config_path, content).unwrap();
  }

  /// Write an installer stand-in that exits with `exit_code` and return its path.
  ///
  /// On success it adds `plugins/installed.txt` under the `-destination` directory.
  #[cfg(unix)]
  pub fn installer(&self, exit_code: i32) -> PathBuf {
    let path = self.root().join("installer.sh");
    let script = format!(
      r#"#!/bin/sh
dest=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-destination" ]; then dest="$arg"; fi
  prev="$arg"
done
echo "installer output for $dest"
if [ {exit_code} -eq 0 ]; then
  mkdir -p "$dest/plugins"
  echo installed > "$dest/plugins/installed.txt"
fi
exit {exit_code}
"#
    );
    std::fs::write(&path, script).unwrap();
    set_executable(&path).unwrap();
    path
  }

  /// Add a base image at `targets/<version>/<os>/<arch>/<name>`.
  pub fn add_target(&self, version: &str, os: &str, arch: &str, name: &str) -> PathBuf {
    let image = self.root().join("targets").join(version).join(os).join(arch).join(name);
    let staging = TempDir::new().unwrap();
    let root = staging.path().join("eclipse");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("eclipse.ini"), "-vmargs\n").unwrap();
    archive::compress(&root, &image).unwrap();
    image
  }

  /// Get a Command for the distrobuild binary pointed at this environment's config.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("distrobuild");
    cmd.current_dir(self.root());
    cmd.arg("--config").arg(&self.config_path);
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
