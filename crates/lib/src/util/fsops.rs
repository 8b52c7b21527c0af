//! Filesystem helpers shared by the pipeline stages.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy a directory tree, skipping entries whose file name appears in
/// `exclude` (at any depth). Symlinks are recreated, not followed.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &[&str]) -> io::Result<u64> {
  let mut copied = 0u64;

  let walker = WalkDir::new(src).sort_by_file_name().into_iter().filter_entry(|e| {
    e.file_name()
      .to_str()
      .map(|name| !exclude.contains(&name))
      .unwrap_or(true)
  });

  for entry in walker {
    let entry = entry.map_err(io::Error::other)?;
    let rel = match entry.path().strip_prefix(src) {
      Ok(rel) if !rel.as_os_str().is_empty() => rel,
      _ => continue,
    };
    let target = dst.join(rel);

    let file_type = entry.file_type();
    if file_type.is_dir() {
      fs::create_dir_all(&target)?;
    } else if file_type.is_symlink() {
      #[cfg(unix)]
      {
        let link_target = fs::read_link(entry.path())?;
        if target.exists() {
          fs::remove_file(&target)?;
        }
        std::os::unix::fs::symlink(link_target, &target)?;
      }
    } else if file_type.is_file() {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(entry.path(), &target)?;
      copied += 1;
    }
  }

  Ok(copied)
}

/// Total size in bytes of all regular files under `path`.
pub fn dir_size(path: &Path) -> u64 {
  WalkDir::new(path)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .filter_map(|e| e.metadata().ok())
    .map(|m| m.len())
    .sum()
}

/// Refresh a file's modification time by rewriting its own contents.
///
/// Build tools decide staleness by mtime comparison against outputs that
/// may have been produced seconds earlier from different sources. Rewriting
/// the bytes moves the mtime forward without changing content.
pub fn bump_mtime(path: &Path) -> io::Result<()> {
  let contents = fs::read(path)?;
  fs::write(path, contents)
}

/// Mark a file executable. No-op outside unix.
pub fn make_executable(path: &Path) -> io::Result<()> {
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
  }
  #[cfg(not(unix))]
  {
    let _ = path;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn copy_tree_preserves_structure() {
    let src = tempdir().unwrap();
    fs::create_dir_all(src.path().join("src/nested")).unwrap();
    fs::write(src.path().join("Cargo.toml"), "[package]").unwrap();
    fs::write(src.path().join("src/main.rs"), "fn main() {}").unwrap();
    fs::write(src.path().join("src/nested/mod.rs"), "pub mod x;").unwrap();

    let dst = tempdir().unwrap();
    let copied = copy_tree(src.path(), dst.path(), &[]).unwrap();

    assert_eq!(copied, 3);
    assert_eq!(
      fs::read_to_string(dst.path().join("src/nested/mod.rs")).unwrap(),
      "pub mod x;"
    );
  }

  #[test]
  fn copy_tree_skips_excluded_names() {
    let src = tempdir().unwrap();
    fs::create_dir_all(src.path().join("target/release")).unwrap();
    fs::create_dir_all(src.path().join(".git")).unwrap();
    fs::write(src.path().join("keep.rs"), "ok").unwrap();
    fs::write(src.path().join("target/release/stale"), "old binary").unwrap();
    fs::write(src.path().join(".git/HEAD"), "ref").unwrap();

    let dst = tempdir().unwrap();
    copy_tree(src.path(), dst.path(), &["target", ".git"]).unwrap();

    assert!(dst.path().join("keep.rs").exists());
    assert!(!dst.path().join("target").exists());
    assert!(!dst.path().join(".git").exists());
  }

  #[test]
  fn copy_tree_overwrites_existing_files() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("main.rs"), "real entry").unwrap();

    let dst = tempdir().unwrap();
    fs::write(dst.path().join("main.rs"), "placeholder").unwrap();
    copy_tree(src.path(), dst.path(), &[]).unwrap();

    assert_eq!(fs::read_to_string(dst.path().join("main.rs")).unwrap(), "real entry");
  }

  #[test]
  fn dir_size_sums_file_lengths() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("a"), vec![0u8; 100]).unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("sub/b"), vec![0u8; 50]).unwrap();

    assert_eq!(dir_size(temp.path()), 150);
  }

  #[test]
  fn bump_mtime_keeps_contents() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("main.rs");
    fs::write(&path, "fn main() {}").unwrap();

    bump_mtime(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "fn main() {}");
  }
}
