//! The content-addressed dependency cache.
//!
//! Compiled dependency sets live in `<store>/deps/<digest>/`, keyed by the
//! manifest-pair digest. An entry is only usable once its completion marker
//! exists; the marker also records a content hash of the entry so later
//! runs can detect corruption and rebuild instead of trusting damaged
//! caches.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::platform::paths::{parent_store_dir, store_dir};
use crate::util::fsops::dir_size;
use crate::util::hash::{ContentHash, DirHashError, ObjectHash, hash_directory};

/// Marker file name indicating a dependency build completed successfully.
pub const ENTRY_COMPLETE_MARKER: &str = ".kiln-complete";

/// Files/directories excluded when hashing entry contents.
/// - ENTRY_COMPLETE_MARKER: the marker itself (written after hashing)
/// - "tmp": builder scratch space (may have leftovers)
pub const ENTRY_HASH_EXCLUSIONS: &[&str] = &[".kiln-complete", "tmp"];

const MARKER_VERSION: u32 = 1;

/// Marker file content structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepsMarker {
  /// Marker format version.
  pub version: u32,
  /// Entry status (always "complete" for successful builds).
  pub status: String,
  /// Full 64-character SHA-256 hash of the entry contents.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output_hash: Option<String>,
  /// Full hash of the binary the placeholder build produced, if any.
  /// The application stage compares its artifact against this to catch
  /// a build that silently kept the placeholder binary.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stub_binary_hash: Option<String>,
  /// When the entry was committed, unix seconds.
  pub created_at_unix: u64,
}

impl DepsMarker {
  pub fn stub_binary_hash(&self) -> Option<ContentHash> {
    self.stub_binary_hash.clone().map(ContentHash)
  }
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to read marker: {message}")]
  ReadMarker { message: String },

  #[error("failed to parse marker: {message}")]
  ParseMarker { message: String },

  #[error("failed to write marker: {message}")]
  WriteMarker { message: String },

  #[error(transparent)]
  Hash(#[from] DirHashError),

  #[error("failed to read store directory: {0}")]
  ReadStore(#[from] std::io::Error),
}

pub fn deps_dir_name(digest: &ObjectHash) -> String {
  digest.0.clone()
}

/// Resolve the store directory for a digest.
///
/// Prefers the primary store. On miss, a configured parent store is
/// consulted; a hit there is linked into the primary store so later runs
/// never pay the lookup again. Returns the primary path for new entries.
pub fn deps_dir_path(digest: &ObjectHash) -> PathBuf {
  let dir_name = deps_dir_name(digest);
  let primary = store_dir().join("deps").join(&dir_name);

  if primary.exists() {
    return primary;
  }

  if let Some(parent) = parent_store_dir() {
    let fallback = parent.join("deps").join(&dir_name);
    if fallback.exists() {
      if let Err(e) = link_entry(&fallback, &primary) {
        warn!(digest = %digest.0, error = %e, "failed to link from parent store, using direct path");
        return fallback;
      }
      return primary;
    }
  }

  primary
}

pub fn entry_exists_in_store(digest: &ObjectHash, store_path: &Path) -> bool {
  store_path.join("deps").join(deps_dir_name(digest)).exists()
}

fn link_entry(src: &Path, dst: &Path) -> std::io::Result<()> {
  if let Some(parent) = dst.parent() {
    std::fs::create_dir_all(parent)?;
  }

  #[cfg(unix)]
  {
    std::os::unix::fs::symlink(src, dst)
  }
  #[cfg(not(unix))]
  {
    let _ = (src, dst);
    Err(std::io::Error::other("parent store linking not supported on this platform"))
  }
}

/// Write the completion marker after a successful dependency build.
pub async fn write_entry_marker(
  entry_path: &Path,
  stub_binary_hash: Option<&ContentHash>,
) -> Result<(), StoreError> {
  // Hash the entry contents first; the marker is excluded from its own hash
  let output_hash = hash_directory(entry_path, ENTRY_HASH_EXCLUSIONS)?;

  let marker = DepsMarker {
    version: MARKER_VERSION,
    status: "complete".to_string(),
    output_hash: Some(output_hash.0),
    stub_binary_hash: stub_binary_hash.map(|h| h.0.clone()),
    created_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
  };
  let content = serde_json::to_string(&marker).expect("failed to serialize marker");
  fs::write(entry_path.join(ENTRY_COMPLETE_MARKER), format!("{}\n", content))
    .await
    .map_err(|e| StoreError::WriteMarker { message: e.to_string() })
}

/// Read an entry's completion marker.
///
/// Returns `None` if the marker doesn't exist.
pub fn read_entry_marker(entry_path: &Path) -> Result<Option<DepsMarker>, StoreError> {
  let marker_path = entry_path.join(ENTRY_COMPLETE_MARKER);

  if !marker_path.exists() {
    return Ok(None);
  }

  let content =
    std::fs::read_to_string(&marker_path).map_err(|e| StoreError::ReadMarker { message: e.to_string() })?;
  let marker: DepsMarker =
    serde_json::from_str(&content).map_err(|e| StoreError::ParseMarker { message: e.to_string() })?;
  Ok(Some(marker))
}

/// Check if an entry has a completion marker.
pub fn is_entry_complete(entry_path: &Path) -> bool {
  read_entry_marker(entry_path).map(|m| m.is_some()).unwrap_or(false)
}

/// Verify a cached entry's contents against its marker.
///
/// Returns `true` if valid (use the cache), `false` if the entry should be
/// rebuilt. Markers without a recorded hash are trusted.
pub fn verify_entry(entry_path: &Path, marker: &DepsMarker) -> bool {
  let Some(stored_hash) = &marker.output_hash else {
    debug!(path = ?entry_path, "marker without content hash, trusting cache");
    return true;
  };

  match hash_directory(entry_path, ENTRY_HASH_EXCLUSIONS) {
    Ok(current_hash) => {
      if current_hash.0 == *stored_hash {
        true
      } else {
        warn!(
          path = ?entry_path,
          expected = %stored_hash,
          actual = %current_hash.0,
          "cache entry corrupted, will rebuild"
        );
        false
      }
    }
    Err(e) => {
      warn!(
        path = ?entry_path,
        error = %e,
        "failed to hash cache entry, will rebuild"
      );
      false
    }
  }
}

/// One store entry as seen by `status` and `gc`.
#[derive(Debug, Serialize)]
pub struct DepsEntrySummary {
  pub digest: String,
  pub path: PathBuf,
  pub complete: bool,
  pub created_at_unix: Option<u64>,
  pub size_bytes: u64,
}

/// List all entries in a store, sorted by digest.
pub fn list_entries(store_path: &Path) -> Result<Vec<DepsEntrySummary>, StoreError> {
  let deps_dir = store_path.join("deps");
  let mut summaries = Vec::new();

  if !deps_dir.exists() {
    return Ok(summaries);
  }

  for entry in std::fs::read_dir(&deps_dir)?.flatten() {
    let path = entry.path();
    if !path.is_dir() {
      continue;
    }

    let digest = match path.file_name().and_then(|n| n.to_str()) {
      Some(name) => name.to_string(),
      None => continue,
    };

    let marker = read_entry_marker(&path).unwrap_or(None);
    summaries.push(DepsEntrySummary {
      digest,
      complete: marker.is_some(),
      created_at_unix: marker.map(|m| m.created_at_unix),
      size_bytes: dir_size(&path),
      path,
    });
  }

  summaries.sort_by(|a, b| a.digest.cmp(&b.digest));
  Ok(summaries)
}
