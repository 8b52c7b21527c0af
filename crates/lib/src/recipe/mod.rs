//! Build recipe loading and validation.
//!
//! A recipe (`kiln.toml`) is the immutable configuration for one pipeline
//! run: what to compile, how to invoke the builder, and the runtime
//! contract of the assembled image. Loading resolves all paths against the
//! recipe's directory, so a `Recipe` in hand is always absolute.

pub mod types;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::RECIPE_FILE_NAME;
use crate::image::RuntimeSpec;
use crate::manifest::ManifestPair;
use types::RecipeFile;

#[derive(Debug, Error)]
pub enum RecipeError {
  #[error("recipe not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read recipe {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse recipe {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    source: Box<toml::de::Error>,
  },

  #[error("invalid project name {0:?}: must be a bare binary name")]
  InvalidName(String),

  #[error("builder command must not be empty")]
  EmptyBuilderCommand,

  #[error("artifact path must be relative to the build directory: {0}")]
  AbsoluteArtifact(PathBuf),

  #[error("install_dir must be an absolute in-image path like /usr/local/bin: {0}")]
  RelativeInstallDir(PathBuf),

  #[error("runtime port must not be 0")]
  ZeroPort,

  #[error("failed to canonicalize {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },
}

/// How the builder is invoked inside a build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderSpec {
  pub command: String,
  pub args: Vec<String>,
  pub env: std::collections::BTreeMap<String, String>,
  /// Relative to the build directory.
  pub artifact: PathBuf,
}

/// A fully resolved recipe. All paths are absolute except
/// `builder.artifact`, which stays relative to whatever build directory a
/// stage prepares.
#[derive(Debug, Clone)]
pub struct Recipe {
  pub name: String,
  /// Directory containing the recipe file.
  pub root: PathBuf,
  /// Source tree to compile.
  pub source: PathBuf,
  pub manifest: ManifestPair,
  pub builder: BuilderSpec,
  pub runtime: RuntimeSpec,
  /// Where the assembled image lands.
  pub image_dir: PathBuf,
}

impl Recipe {
  /// Load a recipe from a `kiln.toml` file or a directory containing one.
  pub fn load(path: &Path) -> Result<Self, RecipeError> {
    let recipe_path = if path.is_dir() { path.join(RECIPE_FILE_NAME) } else { path.to_path_buf() };

    if !recipe_path.is_file() {
      return Err(RecipeError::NotFound(recipe_path));
    }

    let raw = std::fs::read_to_string(&recipe_path).map_err(|e| RecipeError::Read {
      path: recipe_path.clone(),
      source: e,
    })?;
    let file: RecipeFile = toml::from_str(&raw).map_err(|e| RecipeError::Parse {
      path: recipe_path.clone(),
      source: Box::new(e),
    })?;

    let root_raw = match recipe_path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    let root = dunce::canonicalize(root_raw).map_err(|e| RecipeError::Canonicalize {
      path: root_raw.to_path_buf(),
      source: e,
    })?;

    let recipe = Self::resolve(file, root)?;
    debug!(name = %recipe.name, root = %recipe.root.display(), "loaded recipe");
    Ok(recipe)
  }

  fn resolve(file: RecipeFile, root: PathBuf) -> Result<Self, RecipeError> {
    let name = file.project.name;
    if name.is_empty() || name.contains(['/', '\\']) || name.chars().any(char::is_whitespace) {
      return Err(RecipeError::InvalidName(name));
    }

    if file.builder.command.is_empty() {
      return Err(RecipeError::EmptyBuilderCommand);
    }
    let artifact = file
      .builder
      .artifact
      .unwrap_or_else(|| Path::new("target/release").join(&name));
    if artifact.is_absolute() {
      return Err(RecipeError::AbsoluteArtifact(artifact));
    }

    if file.runtime.port == 0 {
      return Err(RecipeError::ZeroPort);
    }
    // In-image paths are POSIX paths whatever the build host is, so this
    // checks for a root component rather than host-absoluteness.
    if !file.runtime.install_dir.has_root() {
      return Err(RecipeError::RelativeInstallDir(file.runtime.install_dir));
    }

    let source = root.join(&file.project.source);
    let manifest = ManifestPair::new(
      source.join(&file.project.manifest),
      source.join(&file.project.lock),
    );

    Ok(Self {
      name,
      source,
      manifest,
      builder: BuilderSpec {
        command: file.builder.command,
        args: file.builder.args,
        env: file.builder.env,
        artifact,
      },
      runtime: RuntimeSpec {
        log_level: file.runtime.log_level,
        port: file.runtime.port,
        install_dir: file.runtime.install_dir,
        env: file.runtime.env,
        ca_bundle: file.runtime.ca_bundle,
      },
      image_dir: root.join(&file.image.output),
      root,
    })
  }

  /// Absolute in-image path of the service binary, always POSIX-style.
  pub fn entry_point(&self) -> String {
    let dir = self.runtime.install_dir.to_string_lossy();
    format!("{}/{}", dir.trim_end_matches('/'), self.name)
  }
}
