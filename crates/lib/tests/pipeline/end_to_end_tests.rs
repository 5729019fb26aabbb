//! Full runs of the orchestrator against real archives and an installer stand-in.

use distrobuild_lib::build::Orchestrator;
use distrobuild_lib::repo::cache_key;
use distrobuild_lib::supervise::Interrupt;
use distrobuild_lib::{BuildConfig, BuildError};

use super::common::{TestEnv, archive_files};

fn config_toml(env: &TestEnv, installer: &str, extra: &str) -> BuildConfig {
  let toml = format!(
    r#"
target_dir = "targets"
build_dir = "build"
dist_dir = "dist"
installer = "{installer}"
static_repos_dir = "repos"
app_name = "myapp"
{extra}
"#
  );
  BuildConfig::from_toml_str(&toml, &env.root()).unwrap()
}

async fn run(config: BuildConfig) -> Result<distrobuild_lib::BuildReport, BuildError> {
  Orchestrator::new(config, Interrupt::never()).run().await
}

#[tokio::test]
async fn builds_distribution_from_tar_gz_image() {
  let env = TestEnv::new();
  let installer = env.installer(0);
  env.add_target("4.2", "linux", "x86_64", "base.tar.gz");

  let config = config_toml(
    &env,
    &installer.display().to_string(),
    r#"
[[install_unit]]
value = "org.example.feature.group"

[[update_site]]
value = "http://download.example.com/releases/juno"
"#,
  );

  let report = run(config).await.unwrap();

  let output = env.dist_dir().join("base-myapp.tar.gz");
  assert_eq!(report.packaged.len(), 1);
  assert_eq!(report.packaged[0].output, output);
  assert_eq!(
    archive_files(&output),
    vec!["configuration/config.ini", "eclipse.ini", "plugins/installed.txt"]
  );
  assert_eq!(std::fs::read_dir(env.dist_dir()).unwrap().count(), 1);
  assert!(!env.build_dir().join("tmp").exists());
}

#[tokio::test]
async fn failing_installer_produces_no_output() {
  let env = TestEnv::new();
  let installer = env.installer(13);
  env.add_target("4.2", "linux", "x86_64", "base.tar.gz");

  let report = run(config_toml(&env, &installer.display().to_string(), "")).await.unwrap();

  assert!(report.packaged.is_empty());
  assert_eq!(report.failed.len(), 1);
  assert_eq!(report.failed[0].reason, "installer failed with exit code 13");
  assert!(!env.dist_dir().join("base-myapp.tar.gz").exists());
}

#[tokio::test]
async fn missing_installer_is_configuration_error() {
  let env = TestEnv::new();
  env.add_target("4.2", "linux", "x86_64", "base.tar.gz");
  let missing = env.root().join("missing-installer");

  let err = run(config_toml(&env, &missing.display().to_string(), "")).await.unwrap_err();

  assert!(matches!(err, BuildError::Configuration(_)));
}

#[tokio::test]
async fn empty_target_tree_does_nothing() {
  let env = TestEnv::new();
  let installer = env.installer(0);

  let report = run(config_toml(&env, &installer.display().to_string(), "")).await.unwrap();

  assert_eq!(report.total(), 0);
  assert!(!env.dist_dir().exists());
}

#[tokio::test]
async fn installer_receives_filtered_units_and_ordered_repositories() {
  let env = TestEnv::new();
  let installer = env.installer(0);
  env.add_target("4.2", "win32", "x86_64", "sdk.zip");
  let shared = env.touch("repos/shared/common.zip");
  let versioned = env.touch("repos/4.2/win32/x86_64/native.zip");
  let local_repo = env.touch("local/extra.zip");

  let mut server = mockito::Server::new_async().await;
  let remote = server
    .mock("GET", "/remote.zip")
    .with_status(200)
    .with_body("zip bytes")
    .expect(1)
    .create_async()
    .await;
  let remote_url = format!("{}/remote.zip", server.url());

  let config = config_toml(
    &env,
    &installer.display().to_string(),
    &format!(
      r#"
[[install_unit]]
value = "core.feature.group"

[[install_unit]]
value = "gtk.feature.group"
os = "linux"

[[install_unit]]
value = "win.feature.group"
version = "4.2"
os = "win32"

[[update_site]]
value = "http://download.example.com/site"

[[repository]]
value = "{remote_url}"

[[repository]]
value = "{local}"
arch = "x86_64"
"#,
      local = local_repo.display()
    ),
  );
  let cache_file = config.cache_dir().join(cache_key(&remote_url));

  let report = run(config).await.unwrap();

  remote.assert_async().await;
  assert_eq!(report.packaged.len(), 1);
  assert!(env.dist_dir().join("sdk-myapp.zip").is_file());
  assert_eq!(std::fs::read(&cache_file).unwrap(), b"zip bytes");

  let args = env.installer_args();
  let position = |flag: &str| args.iter().position(|a| a == flag).unwrap();
  assert_eq!(args[position("-profile") + 1], "SDKProfile");
  assert_eq!(args[position("-installIU") + 1], "core.feature.group,win.feature.group");

  let repositories: Vec<&str> = args[position("-repository") + 1].split(',').collect();
  let jar = |path: &std::path::Path| {
    format!(
      "jar:file:{}/{}!/",
      path.parent().unwrap().display(),
      path.file_name().unwrap().to_string_lossy()
    )
  };
  assert_eq!(
    repositories,
    vec![
      "http://download.example.com/site".to_string(),
      jar(&cache_file),
      jar(&local_repo),
      jar(&shared),
      jar(&versioned),
    ]
  );
}

#[tokio::test]
async fn unreachable_repository_aborts_run() {
  let env = TestEnv::new();
  let installer = env.installer(0);
  env.add_target("4.2", "linux", "x86_64", "base.tar.gz");

  let config = config_toml(
    &env,
    &installer.display().to_string(),
    r#"
http_timeout_secs = 5

[[repository]]
value = "http://127.0.0.1:1/never.zip"
"#,
  );

  let err = run(config).await.unwrap_err();

  assert!(matches!(err, BuildError::RepositoryFetch(_)));
  assert!(!env.dist_dir().exists());
}

#[tokio::test]
async fn parallel_run_packages_all_targets() {
  let env = TestEnv::new();
  let installer = env.installer(0);
  env.add_target("4.2", "linux", "x86_64", "sdk-linux.tar.gz");
  env.add_target("4.2", "macosx", "x86_64", "sdk-mac.tar.gz");
  env.add_target("4.3", "win32", "x86_64", "sdk-win.zip");

  let config = config_toml(&env, &installer.display().to_string(), "jobs = 2");
  let report = run(config).await.unwrap();

  let mut outputs: Vec<String> = std::fs::read_dir(env.dist_dir())
    .unwrap()
    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
    .collect();
  outputs.sort();
  assert_eq!(report.packaged.len(), 3);
  assert_eq!(outputs, vec!["sdk-linux-myapp.tar.gz", "sdk-mac-myapp.tar.gz", "sdk-win-myapp.zip"]);
  assert!(!env.build_dir().join("tmp").exists());
}
