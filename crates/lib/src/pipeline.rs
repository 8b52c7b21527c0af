//! The build pipeline.
//!
//! Owns stage ordering and the store lock. A build is dependency stage,
//! application stage, then image assembly, all under one exclusive lock
//! so concurrent builds cannot interleave store mutations.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::recipe::{Recipe, RecipeError};
use crate::stage::StageError;
use crate::stage::app::build_application;
use crate::stage::assemble::{AssembleError, assemble_image};
use crate::stage::deps::build_dependencies;
use crate::store_lock::{LockMode, StoreLock, StoreLockError};
use crate::util::hash::{ContentHash, ObjectHash};

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Recipe(#[from] RecipeError),

  #[error(transparent)]
  Lock(#[from] StoreLockError),

  #[error(transparent)]
  Stage(#[from] StageError),

  #[error(transparent)]
  Assemble(#[from] AssembleError),
}

/// Summary of one full build run.
#[derive(Debug)]
pub struct BuildReport {
  pub project: String,
  pub deps_digest: ObjectHash,
  pub deps_cache_hit: bool,
  pub artifact_digest: ContentHash,
  pub artifact_size_bytes: u64,
  pub image_dir: PathBuf,
  pub entry_point: String,
  pub elapsed: Duration,
}

/// Run the full pipeline for a loaded recipe.
pub async fn run_build(recipe: &Recipe) -> Result<BuildReport, PipelineError> {
  let started = Instant::now();

  // Held for the whole run: the dependency stage mutates the store and
  // the application stage reads from it
  let _lock = StoreLock::acquire(LockMode::Exclusive, "build")?;

  let deps = build_dependencies(recipe).await?;
  let app = build_application(recipe, &deps).await?;
  let image = assemble_image(recipe, &app.artifact)?;

  let report = BuildReport {
    project: recipe.name.clone(),
    deps_digest: deps.digest,
    deps_cache_hit: deps.cache_hit,
    artifact_digest: app.artifact.digest.clone(),
    artifact_size_bytes: app.artifact.size_bytes,
    image_dir: image.image_dir,
    entry_point: image.entry_point,
    elapsed: started.elapsed(),
  };

  info!(
    project = %report.project,
    cache_hit = report.deps_cache_hit,
    elapsed = ?report.elapsed,
    "build finished"
  );

  Ok(report)
}
