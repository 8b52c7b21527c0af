//! Build stages.
//!
//! A build runs three stages in order: dependency compilation (cached in
//! the store by manifest-pair digest), application compilation (fresh
//! every run, seeded from the cached dependency set), and image assembly.
//! Each stage hands a small outcome struct to the next; the pipeline owns
//! the ordering.

pub mod app;
pub mod assemble;
pub mod deps;

use std::path::PathBuf;

use thiserror::Error;

use crate::exec::ExecError;
use crate::manifest::ManifestError;
use crate::store::StoreError;
use crate::util::hash::DirHashError;

#[derive(Debug, Error)]
pub enum StageError {
  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Exec(#[from] ExecError),

  #[error(transparent)]
  Hash(#[from] DirHashError),

  #[error("builder did not produce the expected artifact at {}", path.display())]
  MissingArtifact { path: PathBuf },

  #[error(
    "artifact at {} is identical to the dependency-stage placeholder binary; the application build did not take effect",
    path.display()
  )]
  StaleArtifact { path: PathBuf },

  #[error("stage io error: {0}")]
  Io(#[from] std::io::Error),
}
