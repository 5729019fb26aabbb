//! Plan command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const UNITS: &str = r#"
[[install_unit]]
value = "org.example.core.feature.group"

[[install_unit]]
value = "org.example.win32.feature.group"
os = "win32"

[[update_site]]
value = "http://download.example.com/releases"
"#;

#[test]
fn plan_lists_targets_and_filtered_units() {
  let env = TestEnv::new();
  env.write_config(UNITS);
  env.add_target("4.2", "linux", "x86_64", "sdk.tar.gz");

  env
    .cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("Targets: 1"))
    .stdout(predicate::str::contains("4.2-linux-x86_64/sdk.tar.gz"))
    .stdout(predicate::str::contains("org.example.core.feature.group"))
    .stdout(predicate::str::contains("org.example.win32.feature.group").not())
    .stdout(predicate::str::contains("sdk-myapp.tar.gz"));

  assert!(!env.root().join("build").exists());
}

#[test]
fn plan_json_output() {
  let env = TestEnv::new();
  env.write_config(UNITS);
  env.add_target("4.2", "win32", "x86_64", "sdk.zip");

  let output = env.cmd().args(["plan", "--output", "json"]).output().unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let target = &plan["targets"][0];
  assert_eq!(target["target"]["os"], "win32");
  assert_eq!(
    target["install_units"],
    serde_json::json!(["org.example.core.feature.group", "org.example.win32.feature.group"])
  );
  assert_eq!(target["repositories"], serde_json::json!(["http://download.example.com/releases"]));
  assert!(
    target["command"]
      .as_array()
      .unwrap()
      .iter()
      .any(|arg| arg == "org.eclipse.equinox.p2.director")
  );
}

#[test]
fn plan_without_targets() {
  let env = TestEnv::new();
  env.write_config("");

  env
    .cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("No build targets found"));
}
