//! The dependency manifest pair.
//!
//! A project's third-party dependency set is fully described by two files:
//! the manifest (direct requirements) and the lockfile (the exact resolved
//! graph). Their combined digest keys the dependency cache, so any edit
//! that could change resolved dependencies lands in a different store
//! entry. Byte equality is the contract: even a comment-only edit produces
//! a new digest.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::util::hash::{ContentHash, ObjectHash};

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("manifest not found: {0}")]
  ManifestMissing(PathBuf),

  #[error("lockfile not found: {0} (pin the dependency set before building)")]
  LockMissing(PathBuf),

  #[error("lockfile is empty: {0}")]
  LockEmpty(PathBuf),

  #[error("failed to read {path}: {message}")]
  Read { path: PathBuf, message: String },

  #[error("failed to copy {path} into {dest}: {message}")]
  Copy {
    path: PathBuf,
    dest: PathBuf,
    message: String,
  },
}

/// The manifest + lockfile pair that pins a project's dependency set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPair {
  pub manifest: PathBuf,
  pub lock: PathBuf,
}

impl ManifestPair {
  pub fn new(manifest: impl Into<PathBuf>, lock: impl Into<PathBuf>) -> Self {
    Self {
      manifest: manifest.into(),
      lock: lock.into(),
    }
  }

  /// Check that both files exist and that the lockfile pins something.
  ///
  /// A missing or empty lockfile is fatal: without it the dependency build
  /// would float to whatever versions resolve today, and the cache digest
  /// would no longer describe a reproducible set.
  pub fn validate(&self) -> Result<(), ManifestError> {
    if !self.manifest.is_file() {
      return Err(ManifestError::ManifestMissing(self.manifest.clone()));
    }
    if !self.lock.is_file() {
      return Err(ManifestError::LockMissing(self.lock.clone()));
    }

    let meta = fs::metadata(&self.lock).map_err(|e| ManifestError::Read {
      path: self.lock.clone(),
      message: e.to_string(),
    })?;
    if meta.len() == 0 {
      return Err(ManifestError::LockEmpty(self.lock.clone()));
    }

    Ok(())
  }

  /// Content-addressed digest of the pair, truncated to store-key length.
  ///
  /// Each file is framed with its role and length so that moving bytes
  /// between the two files cannot collide with the original pair.
  pub fn digest(&self) -> Result<ObjectHash, ManifestError> {
    let manifest_bytes = self.read(&self.manifest)?;
    let lock_bytes = self.read(&self.lock)?;

    let mut hasher = Sha256::new();
    hasher.update(b"manifest\0");
    hasher.update((manifest_bytes.len() as u64).to_le_bytes());
    hasher.update(&manifest_bytes);
    hasher.update(b"lock\0");
    hasher.update((lock_bytes.len() as u64).to_le_bytes());
    hasher.update(&lock_bytes);

    let full = ContentHash(hex::encode(hasher.finalize()));
    Ok(ObjectHash::from_content(&full))
  }

  /// Copy both files into `dir`, keeping their file names.
  pub fn copy_into(&self, dir: &Path) -> Result<(), ManifestError> {
    for path in [&self.manifest, &self.lock] {
      let name = path.file_name().ok_or_else(|| ManifestError::Read {
        path: path.clone(),
        message: "path has no file name".to_string(),
      })?;
      let dest = dir.join(name);
      fs::copy(path, &dest).map_err(|e| ManifestError::Copy {
        path: path.clone(),
        dest: dest.clone(),
        message: e.to_string(),
      })?;
    }
    Ok(())
  }

  fn read(&self, path: &Path) -> Result<Vec<u8>, ManifestError> {
    fs::read(path).map_err(|e| ManifestError::Read {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn write_pair(dir: &Path, manifest: &str, lock: &str) -> ManifestPair {
    let manifest_path = dir.join("Cargo.toml");
    let lock_path = dir.join("Cargo.lock");
    fs::write(&manifest_path, manifest).unwrap();
    fs::write(&lock_path, lock).unwrap();
    ManifestPair::new(manifest_path, lock_path)
  }

  #[test]
  fn digest_is_stable_across_calls() {
    let temp = tempdir().unwrap();
    let pair = write_pair(temp.path(), "[package]\nname = \"app\"", "version = 3");

    assert_eq!(pair.digest().unwrap(), pair.digest().unwrap());
    assert_eq!(pair.digest().unwrap().0.len(), 20);
  }

  #[test]
  fn manifest_edit_changes_digest() {
    let temp = tempdir().unwrap();
    let pair = write_pair(temp.path(), "[package]\nname = \"app\"", "version = 3");
    let before = pair.digest().unwrap();

    fs::write(&pair.manifest, "[package]\nname = \"app\"\n# new dep below").unwrap();

    assert_ne!(before, pair.digest().unwrap());
  }

  #[test]
  fn lock_edit_changes_digest() {
    let temp = tempdir().unwrap();
    let pair = write_pair(temp.path(), "[package]", "serde 1.0.200");
    let before = pair.digest().unwrap();

    fs::write(&pair.lock, "serde 1.0.201").unwrap();

    assert_ne!(before, pair.digest().unwrap());
  }

  #[test]
  fn whitespace_only_edit_changes_digest() {
    // Byte equality is the contract; no normalization happens.
    let temp = tempdir().unwrap();
    let pair = write_pair(temp.path(), "[package]\nname = \"app\"", "version = 3");
    let before = pair.digest().unwrap();

    fs::write(&pair.manifest, "[package]\n\nname = \"app\"").unwrap();

    assert_ne!(before, pair.digest().unwrap());
  }

  #[test]
  fn swapped_file_contents_change_digest() {
    let temp1 = tempdir().unwrap();
    let pair1 = write_pair(temp1.path(), "aaa", "bbb");

    let temp2 = tempdir().unwrap();
    let pair2 = write_pair(temp2.path(), "bbb", "aaa");

    assert_ne!(pair1.digest().unwrap(), pair2.digest().unwrap());
  }

  #[test]
  fn missing_lock_is_fatal() {
    let temp = tempdir().unwrap();
    let manifest = temp.path().join("Cargo.toml");
    fs::write(&manifest, "[package]").unwrap();

    let pair = ManifestPair::new(manifest, temp.path().join("Cargo.lock"));

    assert!(matches!(pair.validate(), Err(ManifestError::LockMissing(_))));
  }

  #[test]
  fn empty_lock_is_fatal() {
    let temp = tempdir().unwrap();
    let pair = write_pair(temp.path(), "[package]", "");

    assert!(matches!(pair.validate(), Err(ManifestError::LockEmpty(_))));
  }

  #[test]
  fn copy_into_preserves_file_names() {
    let temp = tempdir().unwrap();
    let pair = write_pair(temp.path(), "[package]", "version = 3");

    let dest = tempdir().unwrap();
    pair.copy_into(dest.path()).unwrap();

    assert_eq!(
      fs::read_to_string(dest.path().join("Cargo.toml")).unwrap(),
      "[package]"
    );
    assert_eq!(
      fs::read_to_string(dest.path().join("Cargo.lock")).unwrap(),
      "version = 3"
    );
  }
}
