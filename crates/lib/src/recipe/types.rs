//! Raw recipe schema as written in `kiln.toml`.
//!
//! These types mirror the file layout exactly; defaults are applied here so
//! a minimal recipe (just `[project] name = "..."`) is a complete one.
//! Path fields stay relative at this layer. `Recipe::load` resolves them
//! against the recipe's directory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeFile {
  pub project: ProjectSection,
  #[serde(default)]
  pub builder: BuilderSection,
  #[serde(default)]
  pub runtime: RuntimeSection,
  #[serde(default)]
  pub image: ImageSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
  /// Binary name; also the default artifact file name.
  pub name: String,

  /// Source tree root, relative to the recipe file.
  #[serde(default = "default_source")]
  pub source: PathBuf,

  /// Dependency manifest, relative to `source`.
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,

  /// Lockfile, relative to `source`.
  #[serde(default = "default_lock")]
  pub lock: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderSection {
  #[serde(default = "default_command")]
  pub command: String,

  #[serde(default = "default_args")]
  pub args: Vec<String>,

  /// Extra environment passed to the builder, on top of the controlled set.
  #[serde(default)]
  pub env: BTreeMap<String, String>,

  /// Where the builder leaves the binary, relative to the build directory.
  /// Defaults to `target/release/<name>`.
  #[serde(default)]
  pub artifact: Option<PathBuf>,
}

impl Default for BuilderSection {
  fn default() -> Self {
    Self {
      command: default_command(),
      args: default_args(),
      env: BTreeMap::new(),
      artifact: None,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
  /// Default logging verbosity baked into the image environment.
  #[serde(default = "default_log_level")]
  pub log_level: String,

  /// Port the service listens on and the image advertises.
  #[serde(default = "default_port")]
  pub port: u16,

  /// Absolute in-image directory the binary is installed to.
  #[serde(default = "default_install_dir")]
  pub install_dir: PathBuf,

  /// Extra environment defaults baked into the image.
  #[serde(default)]
  pub env: BTreeMap<String, String>,

  /// Explicit CA bundle path; discovery applies when unset.
  #[serde(default)]
  pub ca_bundle: Option<PathBuf>,
}

impl Default for RuntimeSection {
  fn default() -> Self {
    Self {
      log_level: default_log_level(),
      port: default_port(),
      install_dir: default_install_dir(),
      env: BTreeMap::new(),
      ca_bundle: None,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSection {
  /// Image output directory, relative to the recipe file.
  #[serde(default = "default_output")]
  pub output: PathBuf,
}

impl Default for ImageSection {
  fn default() -> Self {
    Self {
      output: default_output(),
    }
  }
}

fn default_source() -> PathBuf {
  PathBuf::from(".")
}

fn default_manifest() -> PathBuf {
  PathBuf::from("Cargo.toml")
}

fn default_lock() -> PathBuf {
  PathBuf::from("Cargo.lock")
}

fn default_command() -> String {
  "cargo".to_string()
}

fn default_args() -> Vec<String> {
  vec!["build".to_string(), "--release".to_string(), "--locked".to_string()]
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_port() -> u16 {
  3000
}

fn default_install_dir() -> PathBuf {
  PathBuf::from("/usr/local/bin")
}

fn default_output() -> PathBuf {
  PathBuf::from("image")
}
