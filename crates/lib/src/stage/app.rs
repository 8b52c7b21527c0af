//! Application stage.
//!
//! Seeds a scratch build directory from the cached dependency set, swaps
//! the stand-in sources for the real tree, and compiles the application.
//! The incremental state carried over from the dependency stage is what
//! makes this step cheap; the stage's job is to guarantee the builder
//! actually recompiled against the real sources.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::exec::run_builder;
use crate::platform::paths::cache_dir;
use crate::recipe::Recipe;
use crate::stage::{StageError, deps::DepsOutcome};
use crate::store::ENTRY_HASH_EXCLUSIONS;
use crate::stub::{STUB_MAIN_PATH, remove_stub_sources};
use crate::util::fsops::{bump_mtime, copy_tree, make_executable};
use crate::util::hash::{ContentHash, hash_file};

/// Directory and file names never copied from the source tree into a
/// build directory. Build outputs and repository metadata have no place
/// in a compile.
const SOURCE_COPY_EXCLUSIONS: &[&str] = &[".git", "target"];

/// The compiled application binary, still inside the scratch directory.
#[derive(Debug)]
pub struct CompiledArtifact {
  pub path: PathBuf,
  pub digest: ContentHash,
  pub size_bytes: u64,
}

/// What the application stage hands to assembly.
///
/// Holds the scratch directory guard: the artifact path points into it,
/// so it must stay alive until assembly has copied the binary out.
#[derive(Debug)]
pub struct AppOutcome {
  pub artifact: CompiledArtifact,
  build_dir: TempDir,
}

impl AppOutcome {
  pub fn scratch_dir(&self) -> &Path {
    self.build_dir.path()
  }
}

/// Compile the application on top of the cached dependency set.
pub async fn build_application(recipe: &Recipe, deps: &DepsOutcome) -> Result<AppOutcome, StageError> {
  info!(project = %recipe.name, "application stage");

  let builds_root = cache_dir().join("builds");
  std::fs::create_dir_all(&builds_root)?;
  let build_dir = tempfile::Builder::new().prefix("kiln-build-").tempdir_in(&builds_root)?;

  // Seed with the compiled dependency set; the marker and scratch space
  // stay behind in the store
  copy_tree(&deps.entry_dir, build_dir.path(), ENTRY_HASH_EXCLUSIONS)?;

  // The stand-in sources must be gone before the real tree lands, so the
  // two can never mix
  remove_stub_sources(build_dir.path())?;

  let mut exclusions: Vec<String> = SOURCE_COPY_EXCLUSIONS.iter().map(|s| s.to_string()).collect();
  if recipe.image_dir.parent() == Some(recipe.source.as_path())
    && let Some(name) = recipe.image_dir.file_name().and_then(|n| n.to_str())
  {
    exclusions.push(name.to_string());
  }
  let exclusion_refs: Vec<&str> = exclusions.iter().map(String::as_str).collect();
  copy_tree(&recipe.source, build_dir.path(), &exclusion_refs)?;

  // The seeded entry carries the stand-in's binary. Builders decide
  // whether to relink by comparing artifact and source timestamps, and a
  // fast build host can leave both inside the same clock tick. Deleting
  // the stale binary and moving the entry point's mtime forward forces
  // the decision.
  let artifact_path = build_dir.path().join(&recipe.builder.artifact);
  if artifact_path.exists() {
    debug!(path = ?artifact_path, "removing dependency-stage binary");
    std::fs::remove_file(&artifact_path)?;
  }
  let main_path = build_dir.path().join(STUB_MAIN_PATH);
  if main_path.exists() {
    bump_mtime(&main_path)?;
  }

  run_builder(&recipe.builder, build_dir.path()).await?;

  if !artifact_path.is_file() {
    return Err(StageError::MissingArtifact { path: artifact_path });
  }

  let digest = hash_file(&artifact_path)?;
  if let Some(stub_hash) = &deps.stub_binary_hash
    && digest == *stub_hash
  {
    return Err(StageError::StaleArtifact { path: artifact_path });
  }

  make_executable(&artifact_path)?;
  let size_bytes = std::fs::metadata(&artifact_path)?.len();

  info!(path = ?artifact_path, size_bytes, "application stage complete");

  Ok(AppOutcome {
    artifact: CompiledArtifact {
      path: artifact_path,
      digest,
      size_bytes,
    },
    build_dir,
  })
}
