//! Argument handling and help output.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn help_flag_works() {
  cargo_bin_cmd!("distrobuild")
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  cargo_bin_cmd!("distrobuild")
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("distrobuild"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build", "plan"] {
    cargo_bin_cmd!("distrobuild")
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn missing_config_fails() {
  let env = TestEnv::new();

  env
    .cmd()
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn invalid_config_fails() {
  let env = TestEnv::new();
  std::fs::write(&env.config_path, "target_dir = \"targets\"\nunknown_key = 1\n").unwrap();

  env
    .cmd()
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load config"));
}
