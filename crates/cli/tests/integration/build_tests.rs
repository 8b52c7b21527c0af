use predicates::prelude::*;

use super::common::{MAIN_RS, TestEnv};

#[test]
fn build_assembles_a_runnable_image() {
  let env = TestEnv::with_project();

  env
    .kiln_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete"))
    .stdout(predicate::str::contains("(compiled)"));

  let binary = env.installed_binary();
  assert!(binary.is_file());
  assert_eq!(std::fs::read_to_string(&binary).unwrap(), MAIN_RS);
  assert!(env.image_dir().join("rootfs/etc/ssl/certs/ca-certificates.crt").is_file());

  let config: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(env.image_dir().join("config.json")).unwrap()).unwrap();
  assert_eq!(config["config"]["Entrypoint"][0], "/usr/local/bin/app");
  let envs: Vec<String> = config["config"]["Env"]
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v.as_str().unwrap().to_string())
    .collect();
  assert!(envs.contains(&"RUST_LOG=info".to_string()));
  assert!(envs.contains(&"PORT=3000".to_string()));
  assert!(config["config"]["ExposedPorts"].get("3000/tcp").is_some());
}

#[test]
fn second_build_hits_the_dependency_cache() {
  let env = TestEnv::with_project();

  env.kiln_cmd().arg("build").assert().success();
  env
    .kiln_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("(cached)"));

  assert_eq!(env.store_entries().len(), 1);
}

#[test]
fn manifest_edit_triggers_a_dependency_rebuild() {
  let env = TestEnv::with_project();

  env.kiln_cmd().arg("build").assert().success();
  env.write_file(
    "project/Cargo.toml",
    "[package]\nname = \"app\"\nversion = \"0.1.0\"\n\n[dependencies]\nserde = \"1\"\n",
  );

  env
    .kiln_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("(compiled)"));

  assert_eq!(env.store_entries().len(), 2);
}

#[test]
fn source_edit_reuses_the_dependency_cache() {
  let env = TestEnv::with_project();

  env.kiln_cmd().arg("build").assert().success();
  env.write_file("project/src/main.rs", "fn main() { serve_v2() }\n");

  env
    .kiln_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("(cached)"));

  assert_eq!(
    std::fs::read_to_string(env.installed_binary()).unwrap(),
    "fn main() { serve_v2() }\n"
  );
}

#[test]
fn missing_lockfile_is_fatal() {
  let env = TestEnv::with_project();
  std::fs::remove_file(env.project_dir.join("Cargo.lock")).unwrap();

  env
    .kiln_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("lockfile not found"));

  assert!(env.store_entries().is_empty());
}

#[test]
fn failing_builder_reports_its_stderr() {
  let env = TestEnv::with_builder("echo 'linker not found' >&2; exit 7");

  env
    .kiln_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("exit code 7"))
    .stderr(predicate::str::contains("linker not found"));
}

#[test]
fn builder_ignoring_the_sources_is_rejected() {
  let env = TestEnv::with_builder("mkdir -p target/release && printf x > target/release/app");

  env
    .kiln_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("placeholder binary"));
}

#[test]
fn missing_ca_bundle_leaves_no_image() {
  let env = TestEnv::with_project();
  std::fs::remove_file(env.ca_path()).unwrap();

  env
    .kiln_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no CA bundle found"));

  assert!(!env.image_dir().exists());
}
