//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Builder script that concatenates the sources into the artifact, standing
/// in for a real compiler. The dependency stage sees only the placeholder
/// source, the application stage the real one, so cache hits and rebuilds
/// are observable from the artifact bytes.
pub const CAT_BUILDER: &str = "mkdir -p target/release && cat src/*.rs > target/release/app";

pub const MAIN_RS: &str = "fn main() { serve() }\n";

/// Isolated test environment.
///
/// Each test gets its own temporary directory with isolated store, cache,
/// and data paths, plus a project tree the kiln binary is pointed at.
pub struct TestEnv {
  pub temp: TempDir,
  pub project_dir: PathBuf,
}

impl TestEnv {
  /// Create an empty environment with just the project directory.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let project_dir = temp.path().join("project");
    std::fs::create_dir_all(&project_dir).unwrap();
    Self { temp, project_dir }
  }

  /// Create an environment holding a buildable project named `app`.
  pub fn with_project() -> Self {
    Self::with_builder(CAT_BUILDER)
  }

  /// Same, with a custom `sh -c` builder script.
  pub fn with_builder(script: &str) -> Self {
    let env = Self::empty();
    env.write_file(
      "project/Cargo.toml",
      "[package]\nname = \"app\"\nversion = \"0.1.0\"\n\n[dependencies]\n",
    );
    env.write_file(
      "project/Cargo.lock",
      "version = 3\n\n[[package]]\nname = \"app\"\nversion = \"0.1.0\"\n",
    );
    env.write_file("project/src/main.rs", MAIN_RS);
    env.write_file(
      "ca.pem",
      "-----BEGIN CERTIFICATE-----\ndGVzdCBidW5kbGU=\n-----END CERTIFICATE-----\n",
    );
    env.write_recipe(script);
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// (Re)write the recipe with the given builder script.
  pub fn write_recipe(&self, script: &str) {
    let recipe = format!(
      "[project]\nname = \"app\"\n\n[builder]\ncommand = \"sh\"\nargs = [\"-c\", {script:?}]\n\n[runtime]\nca_bundle = {ca:?}\n",
      script = script,
      ca = self.ca_path().display().to_string(),
    );
    self.write_file("project/kiln.toml", &recipe);
  }

  pub fn ca_path(&self) -> PathBuf {
    self.temp.path().join("ca.pem")
  }

  pub fn image_dir(&self) -> PathBuf {
    self.project_dir.join("image")
  }

  pub fn installed_binary(&self) -> PathBuf {
    self.image_dir().join("rootfs/usr/local/bin/app")
  }

  /// Store path (isolated per test).
  pub fn store_path(&self) -> PathBuf {
    self.temp.path().join("store")
  }

  pub fn cache_path(&self) -> PathBuf {
    self.temp.path().join("cache")
  }

  pub fn data_path(&self) -> PathBuf {
    self.temp.path().join("data")
  }

  /// Dependency-cache entry directories currently in the store.
  pub fn store_entries(&self) -> Vec<PathBuf> {
    let deps = self.store_path().join("deps");
    if !deps.is_dir() {
      return Vec::new();
    }
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(&deps)
      .unwrap()
      .flatten()
      .map(|e| e.path())
      .filter(|p| p.is_dir())
      .collect();
    dirs.sort();
    dirs
  }

  /// Shift every cache-entry marker's creation time into the past.
  pub fn backdate_entries(&self, days: u64) {
    for entry in self.store_entries() {
      let marker_path = entry.join(".kiln-complete");
      if !marker_path.is_file() {
        continue;
      }
      let raw = std::fs::read_to_string(&marker_path).unwrap();
      let mut marker: serde_json::Value = serde_json::from_str(&raw).unwrap();
      let created = marker["created_at_unix"].as_u64().unwrap();
      marker["created_at_unix"] = serde_json::Value::from(created.saturating_sub(days * 24 * 60 * 60));
      std::fs::write(&marker_path, serde_json::to_string(&marker).unwrap()).unwrap();
    }
  }

  /// Get a pre-configured Command for the kiln binary.
  ///
  /// Runs from the project directory with environment variables pointing
  /// every store, cache, and data path into the temp directory.
  pub fn kiln_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("kiln");
    cmd.current_dir(&self.project_dir);
    cmd.env("KILN_STORE", self.store_path());
    cmd.env("XDG_CACHE_HOME", self.cache_path());
    cmd.env("XDG_DATA_HOME", self.data_path());
    cmd.env("LOCALAPPDATA", self.cache_path()); // For Windows cache
    cmd.env_remove("KILN_PARENT_STORE");
    cmd.env_remove("KILN_CA_BUNDLE");
    cmd
  }
}
