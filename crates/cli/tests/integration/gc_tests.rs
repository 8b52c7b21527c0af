use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn gc_keeps_fresh_entries() {
  let env = TestEnv::with_project();
  env.kiln_cmd().arg("build").assert().success();

  env
    .kiln_cmd()
    .arg("gc")
    .assert()
    .success()
    .stdout(predicate::str::contains("Entries removed: 0"));

  assert_eq!(env.store_entries().len(), 1);
}

#[test]
fn gc_sweeps_aged_out_entries() {
  let env = TestEnv::with_project();
  env.kiln_cmd().arg("build").assert().success();
  env.backdate_entries(100);

  env
    .kiln_cmd()
    .arg("gc")
    .assert()
    .success()
    .stdout(predicate::str::contains("Entries removed: 1"));

  assert!(env.store_entries().is_empty());
}

#[test]
fn gc_honors_a_longer_max_age() {
  let env = TestEnv::with_project();
  env.kiln_cmd().arg("build").assert().success();
  env.backdate_entries(100);

  env
    .kiln_cmd()
    .args(["gc", "--max-age-days", "365"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Entries removed: 0"));

  assert_eq!(env.store_entries().len(), 1);
}

#[test]
fn gc_dry_run_reports_but_keeps_entries() {
  let env = TestEnv::with_project();
  env.kiln_cmd().arg("build").assert().success();
  env.backdate_entries(100);

  env
    .kiln_cmd()
    .args(["gc", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("Entries removed: 1"));

  assert_eq!(env.store_entries().len(), 1);
}

#[test]
fn gc_sweeps_incomplete_entries_regardless_of_age() {
  let env = TestEnv::empty();
  let orphan = env.store_path().join("deps/0000aaaa0000aaaa0000");
  std::fs::create_dir_all(&orphan).unwrap();
  std::fs::write(orphan.join("Cargo.toml"), "[package]").unwrap();

  env
    .kiln_cmd()
    .arg("gc")
    .assert()
    .success()
    .stdout(predicate::str::contains("Entries removed: 1"));

  assert!(!orphan.exists());
}
