//! Store garbage collection.
//!
//! Two sweeps: cache entries in the store, and leftover scratch
//! directories from interrupted application builds. An entry without a
//! completion marker is junk from a failed or interrupted dependency
//! build and always goes; complete entries go once they age past the
//! configured limit. GC runs under the exclusive store lock, so every
//! scratch directory it sees is an orphan.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{fs, io};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::platform::paths::{cache_dir, store_dir};
use crate::store::read_entry_marker;
use crate::util::fsops::dir_size;

#[derive(Debug, Error)]
pub enum GcError {
  #[error("failed to read store directory: {0}")]
  ReadStore(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct GcOptions {
  /// Complete entries older than this are swept. `None` disables the age
  /// rule; incomplete entries are swept regardless.
  pub max_age: Option<Duration>,
  pub dry_run: bool,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct GcStats {
  pub entries_scanned: usize,
  pub entries_deleted: usize,
  pub entries_bytes_freed: u64,
  pub scratch_scanned: usize,
  pub scratch_deleted: usize,
  pub scratch_bytes_freed: u64,
}

impl GcStats {
  pub fn total_deleted(&self) -> usize {
    self.entries_deleted + self.scratch_deleted
  }

  pub fn total_bytes_freed(&self) -> u64 {
    self.entries_bytes_freed + self.scratch_bytes_freed
  }
}

#[derive(Debug, serde::Serialize)]
pub struct GcResult {
  pub stats: GcStats,
  pub deleted_paths: Vec<PathBuf>,
}

fn now_unix() -> u64 {
  SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

pub fn collect_garbage(options: &GcOptions) -> Result<GcResult, GcError> {
  let mut stats = GcStats::default();
  let mut deleted_paths = Vec::new();

  let deps_dir = store_dir().join("deps");
  if deps_dir.exists() {
    sweep_entries(&deps_dir, options, &mut stats, &mut deleted_paths)?;
  }

  let builds_dir = cache_dir().join("builds");
  if builds_dir.exists() {
    sweep_scratch(&builds_dir, options, &mut stats, &mut deleted_paths)?;
  }

  info!(
    entries_deleted = stats.entries_deleted,
    scratch_deleted = stats.scratch_deleted,
    bytes_freed = stats.total_bytes_freed(),
    dry_run = options.dry_run,
    "garbage collection complete"
  );

  Ok(GcResult { stats, deleted_paths })
}

fn sweep_entries(
  deps_dir: &Path,
  options: &GcOptions,
  stats: &mut GcStats,
  deleted_paths: &mut Vec<PathBuf>,
) -> Result<(), GcError> {
  let now = now_unix();

  for entry in fs::read_dir(deps_dir)?.flatten() {
    let path = entry.path();
    if !path.is_dir() {
      continue;
    }

    stats.entries_scanned += 1;

    // A garbled marker counts as no marker; both mean the entry never
    // finished cleanly
    let marker = read_entry_marker(&path).unwrap_or(None);

    let keep = match &marker {
      Some(marker) => match options.max_age {
        Some(max_age) => now.saturating_sub(marker.created_at_unix) <= max_age.as_secs(),
        None => true,
      },
      None => false,
    };
    if keep {
      continue;
    }

    if marker.is_none() {
      debug!(path = %path.display(), "removing incomplete cache entry");
    } else {
      debug!(path = %path.display(), "removing aged-out cache entry");
    }

    let size = dir_size(&path);
    if options.dry_run {
      stats.entries_deleted += 1;
      stats.entries_bytes_freed += size;
      deleted_paths.push(path);
    } else {
      match fs::remove_dir_all(&path) {
        Ok(()) => {
          stats.entries_deleted += 1;
          stats.entries_bytes_freed += size;
          deleted_paths.push(path);
        }
        Err(e) => {
          warn!(path = %path.display(), error = %e, "failed to delete cache entry");
        }
      }
    }
  }

  Ok(())
}

fn sweep_scratch(
  builds_dir: &Path,
  options: &GcOptions,
  stats: &mut GcStats,
  deleted_paths: &mut Vec<PathBuf>,
) -> Result<(), GcError> {
  for entry in fs::read_dir(builds_dir)?.flatten() {
    let path = entry.path();
    if !path.is_dir() {
      continue;
    }

    stats.scratch_scanned += 1;
    debug!(path = %path.display(), "removing orphaned scratch directory");

    let size = dir_size(&path);
    if options.dry_run {
      stats.scratch_deleted += 1;
      stats.scratch_bytes_freed += size;
      deleted_paths.push(path);
    } else {
      match fs::remove_dir_all(&path) {
        Ok(()) => {
          stats.scratch_deleted += 1;
          stats.scratch_bytes_freed += size;
          deleted_paths.push(path);
        }
        Err(e) => {
          warn!(path = %path.display(), error = %e, "failed to delete scratch directory");
        }
      }
    }
  }

  Ok(())
}
