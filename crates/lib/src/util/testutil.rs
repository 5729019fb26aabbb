//! Test utilities for distrobuild-lib.
//!
//! Helpers that lay out target trees, base images and a scripted stand-in for the
//! installer. Unix only, since the installer stand-in is a shell script.

use std::path::{Path, PathBuf};

use crate::archive;
use crate::util::fs::set_executable;

/// Write a shell script that behaves like the installer.
///
/// The script records its arguments in `<script>.args` (one per line), prints a line
/// to each stream, writes `plugins/installed.txt` into the `-destination` directory
/// and exits with `exit_code`. Nothing is written into the destination on a non-zero exit.
#[cfg(unix)]
pub fn fake_installer(dir: &Path, exit_code: i32) -> PathBuf {
  let path = dir.join("installer.sh");
  let script = format!(
    r#"#!/bin/sh
printf '%s\n' "$@" > "$0.args"
dest=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-destination" ]; then dest="$arg"; fi
  prev="$arg"
done
echo "installing into $dest"
echo "simulated warning" >&2
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

/// Arguments the fake installer at `installer` received on its last run.
pub fn recorded_args(installer: &Path) -> Vec<String> {
  let mut args_path = installer.as_os_str().to_owned();
  args_path.push(".args");
  std::fs::read_to_string(PathBuf::from(args_path))
    .unwrap()
    .lines()
    .map(str::to_string)
    .collect()
}

/// Write a base image at `image` whose single top-level directory is `root_name`
/// holding `files` (relative path, content).
pub fn write_base_image(image: &Path, root_name: &str, files: &[(&str, &str)]) {
  let staging = tempfile::TempDir::new().unwrap();
  let root = staging.path().join(root_name);
  for (rel, content) in files {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }
  archive::compress(&root, image).unwrap();
}

/// Create `<target_dir>/<version>/<os>/<arch>/<name>` as a base image with one file.
pub fn add_target(target_dir: &Path, version: &str, os: &str, arch: &str, name: &str) -> PathBuf {
  let image = target_dir.join(version).join(os).join(arch).join(name);
  write_base_image(&image, "eclipse", &[("eclipse.ini", "-vmargs\n")]);
  image
}
