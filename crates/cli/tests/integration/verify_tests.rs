use predicates::prelude::*;

use super::common::TestEnv;

fn built_env() -> TestEnv {
  let env = TestEnv::with_project();
  env.kiln_cmd().arg("build").assert().success();
  env
}

#[test]
fn fresh_image_passes_verification() {
  let env = built_env();

  env
    .kiln_cmd()
    .arg("verify")
    .arg(env.image_dir())
    .assert()
    .success()
    .stdout(predicate::str::contains("Image surface is clean"))
    .stdout(predicate::str::contains("/usr/local/bin/app"));
}

#[test]
fn planted_toolchain_binary_is_a_violation() {
  let env = built_env();
  std::fs::write(env.image_dir().join("rootfs/usr/local/bin/cargo"), b"fake").unwrap();

  env
    .kiln_cmd()
    .arg("verify")
    .arg(env.image_dir())
    .assert()
    .code(2)
    .stdout(predicate::str::contains("cargo"));
}

#[test]
fn unexpected_extra_file_is_a_violation() {
  let env = built_env();
  std::fs::write(env.image_dir().join("rootfs/notes.txt"), b"todo").unwrap();

  env
    .kiln_cmd()
    .arg("verify")
    .arg(env.image_dir())
    .assert()
    .code(2)
    .stdout(predicate::str::contains("notes.txt"));
}

#[test]
fn source_file_in_rootfs_is_a_violation() {
  let env = built_env();
  let src = env.image_dir().join("rootfs/app/src");
  std::fs::create_dir_all(&src).unwrap();
  std::fs::write(src.join("main.rs"), b"fn main() {}").unwrap();

  env
    .kiln_cmd()
    .arg("verify")
    .arg(env.image_dir())
    .assert()
    .code(2)
    .stdout(predicate::str::contains("src"));
}

#[test]
fn missing_config_is_a_violation() {
  let env = built_env();
  std::fs::remove_file(env.image_dir().join("config.json")).unwrap();

  env
    .kiln_cmd()
    .arg("verify")
    .arg(env.image_dir())
    .assert()
    .code(2)
    .stdout(predicate::str::contains("config.json is missing"));
}

#[test]
fn garbled_config_is_a_violation() {
  let env = built_env();
  std::fs::write(env.image_dir().join("config.json"), "{ not json").unwrap();

  env
    .kiln_cmd()
    .arg("verify")
    .arg(env.image_dir())
    .assert()
    .code(2)
    .stdout(predicate::str::contains("does not parse"));
}
