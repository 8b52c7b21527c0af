//! Stand-in entry point for the dependency stage.
//!
//! Dependency compilation needs a crate that compiles without the real
//! application sources: the manifest pair describes the dependency graph,
//! and a minimal `src/main.rs` gives the builder something to link. The
//! application stage later removes the stand-in tree wholesale before the
//! real sources are copied in, so none of it can survive into the final
//! binary.

use std::path::{Path, PathBuf};

/// The entire stand-in program. The binary it produces exists only to make
/// dependency compilation succeed; its hash is recorded in the cache entry
/// so the application stage can detect when it leaks through unchanged.
pub const STUB_SOURCE: &str = "fn main() {}\n";

/// Relative path of the stand-in entry point inside a build directory.
pub const STUB_MAIN_PATH: &str = "src/main.rs";

/// Write the stand-in entry point under `build_dir`, creating `src/`.
pub fn write_stub(build_dir: &Path) -> std::io::Result<PathBuf> {
  let main_path = build_dir.join(STUB_MAIN_PATH);
  if let Some(parent) = main_path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(&main_path, STUB_SOURCE)?;
  Ok(main_path)
}

/// Remove the stand-in sources from `build_dir`.
///
/// The whole `src/` tree goes, not just `main.rs`. The real sources are
/// copied in afterwards and must not mix with stand-in files.
pub fn remove_stub_sources(build_dir: &Path) -> std::io::Result<()> {
  let src_dir = build_dir.join("src");
  if src_dir.exists() {
    std::fs::remove_dir_all(&src_dir)?;
  }
  Ok(())
}
