//! Dependency stage.
//!
//! Compiles the dependency graph against a stand-in entry point and caches
//! the result in the store, keyed by the manifest-pair digest. Source edits
//! never invalidate these entries; only manifest or lock edits do.

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, info};

use crate::exec::run_builder;
use crate::recipe::Recipe;
use crate::stage::StageError;
use crate::store::{deps_dir_path, read_entry_marker, verify_entry, write_entry_marker};
use crate::stub::write_stub;
use crate::util::hash::{ContentHash, ObjectHash, hash_file};

/// What the dependency stage hands to the application stage.
#[derive(Debug)]
pub struct DepsOutcome {
  pub digest: ObjectHash,
  /// Store directory holding the compiled dependency set.
  pub entry_dir: PathBuf,
  pub cache_hit: bool,
  /// Hash of the binary the stand-in entry point produced, when the entry
  /// records one.
  pub stub_binary_hash: Option<ContentHash>,
}

/// Build the cached dependency set for a recipe, or reuse it.
pub async fn build_dependencies(recipe: &Recipe) -> Result<DepsOutcome, StageError> {
  recipe.manifest.validate()?;
  let digest = recipe.manifest.digest()?;

  info!(project = %recipe.name, digest = %digest.0, "dependency stage");

  let entry_dir = deps_dir_path(&digest);

  if entry_dir.exists() {
    match read_entry_marker(&entry_dir) {
      Ok(Some(marker)) => {
        if verify_entry(&entry_dir, &marker) {
          info!(path = ?entry_dir, "dependency cache hit");
          return Ok(DepsOutcome {
            digest,
            entry_dir,
            cache_hit: true,
            stub_binary_hash: marker.stub_binary_hash(),
          });
        }
        debug!(path = ?entry_dir, "removing corrupted cache entry");
        fs::remove_dir_all(&entry_dir).await?;
      }
      Ok(None) => {
        debug!(path = ?entry_dir, "incomplete cache entry found, removing");
        fs::remove_dir_all(&entry_dir).await?;
      }
      Err(e) => {
        debug!(path = ?entry_dir, error = %e, "unreadable marker, removing entry");
        fs::remove_dir_all(&entry_dir).await?;
      }
    }
  }

  // A dangling link left behind by a vanished parent-store entry would
  // make create_dir_all fail with AlreadyExists
  if entry_dir.symlink_metadata().is_ok() && !entry_dir.exists() {
    fs::remove_file(&entry_dir).await?;
  }

  fs::create_dir_all(&entry_dir).await?;

  recipe.manifest.copy_into(&entry_dir)?;
  write_stub(&entry_dir)?;

  run_builder(&recipe.builder, &entry_dir).await?;

  let artifact_path = entry_dir.join(&recipe.builder.artifact);
  if !artifact_path.is_file() {
    return Err(StageError::MissingArtifact { path: artifact_path });
  }

  // Record what the stand-in produced so the application stage can tell
  // a real artifact from a leaked placeholder binary
  let stub_hash = hash_file(&artifact_path)?;
  write_entry_marker(&entry_dir, Some(&stub_hash)).await?;

  info!(path = ?entry_dir, "dependency stage complete");

  Ok(DepsOutcome {
    digest,
    entry_dir,
    cache_hit: false,
    stub_binary_hash: Some(stub_hash),
  })
}
