use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn status_on_a_fresh_store_shows_zero_entries() {
  let env = TestEnv::empty();

  env
    .kiln_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("Entries: 0 (0 complete)"));
}

#[test]
fn status_lists_entries_after_a_build() {
  let env = TestEnv::with_project();
  env.kiln_cmd().arg("build").assert().success();

  let digest = env.store_entries()[0].file_name().unwrap().to_string_lossy().to_string();

  env
    .kiln_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("Entries: 1 (1 complete)"))
    .stdout(predicate::str::contains(&digest[..12]));
}

#[test]
fn status_verbose_shows_entry_paths() {
  let env = TestEnv::with_project();
  env.kiln_cmd().arg("build").assert().success();

  let entry_path = env.store_entries()[0].to_string_lossy().to_string();

  env
    .kiln_cmd()
    .args(["status", "--verbose"])
    .assert()
    .success()
    .stdout(predicate::str::contains(entry_path));
}

#[test]
fn status_json_reports_the_entry() {
  let env = TestEnv::with_project();
  env.kiln_cmd().arg("build").assert().success();

  let output = env.kiln_cmd().args(["status", "-o", "json"]).assert().success();
  let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
  let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();

  assert_eq!(parsed["entries"].as_array().unwrap().len(), 1);
  assert_eq!(parsed["entries"][0]["complete"], true);
  assert!(parsed["total_bytes"].as_u64().unwrap() > 0);
}
