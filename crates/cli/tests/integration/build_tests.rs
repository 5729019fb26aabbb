//! Build command integration tests.

#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_packages_distribution() {
  let env = TestEnv::new();
  let installer = env.installer(0);
  env.write_config(&format!("installer = \"{}\"\n", installer.display()));
  env.add_target("4.2", "linux", "x86_64", "base.tar.gz");

  env
    .cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("installer output for"))
    .stdout(predicate::str::contains("Packaged: 1"))
    .stderr(predicate::str::contains("Build distro for 4.2 - linux - x86_64"));

  assert!(env.root().join("dist/base-myapp.tar.gz").is_file());
  assert!(!env.root().join("build/tmp").exists());
}

#[test]
fn build_reports_failed_installer_and_continues() {
  let env = TestEnv::new();
  let installer = env.installer(2);
  env.write_config(&format!("installer = \"{}\"\n", installer.display()));
  env.add_target("4.2", "linux", "x86_64", "base.tar.gz");
  env.add_target("4.2", "win32", "x86_64", "base.zip");

  env
    .cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Failed: 2"))
    .stderr(predicate::str::contains("Export failed"))
    .stderr(predicate::str::contains("installer failed with exit code 2"));

  assert!(!env.root().join("dist").exists());
}

#[test]
fn build_without_installer_fails() {
  let env = TestEnv::new();
  env.write_config("");
  env.add_target("4.2", "linux", "x86_64", "base.tar.gz");

  env
    .cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("installer executable not defined"));
}

#[test]
fn installer_flag_overrides_config() {
  let env = TestEnv::new();
  let installer = env.installer(0);
  env.write_config("installer = \"/nonexistent/installer\"\n");
  env.add_target("4.2", "macosx", "x86_64", "sdk.tar.gz");

  env
    .cmd()
    .arg("build")
    .arg("--installer")
    .arg(&installer)
    .args(["--jobs", "2"])
    .assert()
    .success();

  assert!(env.root().join("dist/sdk-myapp.tar.gz").is_file());
}

#[test]
fn zero_jobs_is_rejected() {
  let env = TestEnv::new();
  let installer = env.installer(0);
  env.write_config(&format!("installer = \"{}\"\n", installer.display()));

  env
    .cmd()
    .args(["build", "--jobs", "0"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--jobs must be at least 1"));
}
