//! Minimal-surface rules for assembled images.
//!
//! The runtime tree may contain the service binary and the CA bundle and
//! nothing else. These rules catch the classic fat-image mistakes: source
//! files, build trees, dependency manifests, toolchain binaries.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A path that fails the minimal-surface check, with the rule it broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
  pub path: PathBuf,
  pub reason: String,
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.path.display(), self.reason)
  }
}

const DENIED_DIR_NAMES: &[&str] = &["src", "target", ".git", ".cargo", "registry"];
const DENIED_FILE_NAMES: &[&str] = &["Cargo.toml", "Cargo.lock"];
const DENIED_EXTENSIONS: &[&str] = &["rs", "rlib", "rmeta", "d"];
const DENIED_TOOL_NAMES: &[&str] = &["cargo", "rustc", "rustup", "cc", "ld"];

/// Scan a rootfs for anything a runtime image must not carry.
///
/// Rule-based: flags build-time directory names, dependency manifests,
/// source and object files, and toolchain binaries wherever they appear.
pub fn scan_rootfs(root: &Path) -> io::Result<Vec<Violation>> {
  let mut violations = Vec::new();

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(io::Error::other)?;
    if entry.path() == root {
      continue;
    }

    let name = entry.file_name().to_string_lossy().to_string();
    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();

    if entry.file_type().is_dir() {
      if DENIED_DIR_NAMES.contains(&name.as_str()) {
        violations.push(Violation {
          path: rel,
          reason: format!("build-time directory `{name}` in runtime image"),
        });
      }
      continue;
    }

    if DENIED_FILE_NAMES.contains(&name.as_str()) {
      violations.push(Violation {
        path: rel,
        reason: format!("dependency manifest `{name}` in runtime image"),
      });
    } else if let Some(ext) = entry.path().extension().and_then(|e| e.to_str())
      && DENIED_EXTENSIONS.contains(&ext)
    {
      violations.push(Violation {
        path: rel,
        reason: format!("build artifact with `.{ext}` extension in runtime image"),
      });
    } else if DENIED_TOOL_NAMES.contains(&name.as_str()) {
      violations.push(Violation {
        path: rel,
        reason: format!("toolchain binary `{name}` in runtime image"),
      });
    }
  }

  Ok(violations)
}

/// Compare a rootfs against the exact set of files assembly placed.
///
/// `expected` holds rootfs-relative paths. Any regular file outside that
/// set is a violation; assembly is the sole author of the tree.
pub fn verify_exact_contents(root: &Path, expected: &[PathBuf]) -> io::Result<Vec<Violation>> {
  let allowed: BTreeSet<&Path> = expected.iter().map(PathBuf::as_path).collect();
  let mut violations = Vec::new();

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(io::Error::other)?;
    if !entry.file_type().is_file() {
      continue;
    }

    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
    if !allowed.contains(rel) {
      violations.push(Violation {
        path: rel.to_path_buf(),
        reason: "unexpected file in runtime image".to_string(),
      });
    }
  }

  Ok(violations)
}
