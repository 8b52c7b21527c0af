//! Image assembly.
//!
//! Lays the compiled binary and the CA bundle into a fresh rootfs, writes
//! the image configuration next to it, and then verifies the result: the
//! rootfs must contain exactly what assembly placed and nothing that looks
//! like build tooling. Assembly is the sole author of the output tree, so
//! anything else found there is someone else's data and a hard error.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::image::surface::{Violation, scan_rootfs, verify_exact_contents};
use crate::image::{CA_BUNDLE_INSTALL_PATH, CaBundleNotFound, ImageConfig, resolve_ca_bundle};
use crate::platform::Platform;
use crate::recipe::Recipe;
use crate::stage::app::CompiledArtifact;
use crate::util::fsops::make_executable;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const ROOTFS_DIR_NAME: &str = "rootfs";

#[derive(Debug, Error)]
pub enum AssembleError {
  #[error(
    "refusing to overwrite {}: it is not empty and does not look like a previous image output",
    path.display()
  )]
  RefusingOverwrite { path: PathBuf },

  #[error(transparent)]
  CaBundle(#[from] CaBundleNotFound),

  #[error("cannot stamp an image config for this build host (unknown OS or architecture)")]
  UnsupportedPlatform,

  #[error("runtime image verification failed:\n{}", format_violations(.violations))]
  SurfaceViolations { violations: Vec<Violation> },

  #[error("failed to serialize image config: {0}")]
  Config(#[from] serde_json::Error),

  #[error("image assembly io error: {0}")]
  Io(#[from] std::io::Error),
}

fn format_violations(violations: &[Violation]) -> String {
  violations
    .iter()
    .map(|v| format!("  {v}"))
    .collect::<Vec<_>>()
    .join("\n")
}

/// The assembled image on disk.
#[derive(Debug)]
pub struct ImageOutcome {
  pub image_dir: PathBuf,
  pub rootfs_dir: PathBuf,
  pub config_path: PathBuf,
  pub entry_point: String,
  /// Host path the CA bundle was copied from.
  pub ca_bundle_source: PathBuf,
}

/// Assemble the runtime image for a compiled artifact.
pub fn assemble_image(recipe: &Recipe, artifact: &CompiledArtifact) -> Result<ImageOutcome, AssembleError> {
  info!(project = %recipe.name, image_dir = ?recipe.image_dir, "assembling image");

  // Resolve prerequisites before touching the output directory so a missing
  // bundle or unknown host leaves any previous image intact
  let ca_bundle_source = resolve_ca_bundle(recipe.runtime.ca_bundle.as_deref())?;
  let platform = Platform::current().ok_or(AssembleError::UnsupportedPlatform)?;

  let image_dir = recipe.image_dir.clone();
  prepare_image_dir(&image_dir)?;

  let rootfs_dir = image_dir.join(ROOTFS_DIR_NAME);
  std::fs::create_dir_all(&rootfs_dir)?;

  let entry_point = recipe.entry_point();
  let binary_rel = PathBuf::from(entry_point.trim_start_matches('/'));
  let binary_dest = rootfs_dir.join(&binary_rel);
  if let Some(parent) = binary_dest.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::copy(&artifact.path, &binary_dest)?;
  make_executable(&binary_dest)?;
  debug!(dest = ?binary_dest, "installed application binary");

  let ca_rel = PathBuf::from(CA_BUNDLE_INSTALL_PATH);
  let ca_dest = rootfs_dir.join(&ca_rel);
  if let Some(parent) = ca_dest.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::copy(&ca_bundle_source, &ca_dest)?;
  debug!(source = ?ca_bundle_source, dest = ?ca_dest, "installed CA bundle");

  let config = ImageConfig::new(platform, &recipe.runtime, &entry_point);
  let config_path = image_dir.join(CONFIG_FILE_NAME);
  let rendered = serde_json::to_string_pretty(&config)?;
  std::fs::write(&config_path, format!("{rendered}\n"))?;

  let mut violations = scan_rootfs(&rootfs_dir)?;
  violations.extend(verify_exact_contents(&rootfs_dir, &[binary_rel, ca_rel])?);
  if !violations.is_empty() {
    return Err(AssembleError::SurfaceViolations { violations });
  }

  info!(image_dir = ?image_dir, entry_point = %entry_point, "image assembled");

  Ok(ImageOutcome {
    image_dir,
    rootfs_dir,
    config_path,
    entry_point,
    ca_bundle_source,
  })
}

/// Clear the way for a fresh image directory.
///
/// A directory that is empty or carries a previous run's `config.json` is
/// replaced. Anything else was not written by this tool and stays put.
fn prepare_image_dir(image_dir: &Path) -> Result<(), AssembleError> {
  if !image_dir.exists() {
    return Ok(());
  }

  let is_empty = std::fs::read_dir(image_dir)?.next().is_none();
  let is_previous_output = image_dir.join(CONFIG_FILE_NAME).is_file();
  if !is_empty && !is_previous_output {
    return Err(AssembleError::RefusingOverwrite {
      path: image_dir.to_path_buf(),
    });
  }

  debug!(path = ?image_dir, "replacing previous image output");
  std::fs::remove_dir_all(image_dir)?;
  Ok(())
}
